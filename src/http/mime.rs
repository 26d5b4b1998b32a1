/// Static extension to MIME type table.
///
/// Lookups are case-insensitive on the extension. Unknown or missing
/// extensions yield `None`; callers omit `Content-Type` rather than guess.
#[derive(Debug)]
pub struct MimeTable {
    entries: &'static [(&'static str, &'static str)],
}

pub static MIME_TYPES: MimeTable = MimeTable::new(&[
    ("htm", "text/html"),
    ("html", "text/html"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("svg", "image/svg+xml"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("json", "application/json"),
    ("wasm", "application/wasm"),
    ("xml", "text/xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("mp3", "audio/mpeg"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("xhtml", "application/xhtml+xml"),
]);

impl MimeTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// MIME type for the extension of the last path segment of `uri`.
    ///
    /// Any query string is ignored.
    pub fn lookup(&self, uri: &str) -> Option<&'static str> {
        let path = uri.split('?').next().unwrap_or(uri);
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;

        self.entries
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, mime)| *mime)
    }
}
