use std::path::{Path, PathBuf};

use crate::error::ServeError;
use crate::http::buffer::ByteBuffer;

/// File substituted when a request names a directory-like path.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Where a request points on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Request path without the query string, default document applied
    pub uri_path: String,
    /// Absolute filesystem path under the root
    pub path: PathBuf,
    /// The request path ended in a separator
    pub directory_like: bool,
}

/// An opened regular file and its length at the time it was opened.
#[derive(Debug)]
pub struct OpenFile {
    pub file: std::fs::File,
    pub length: u64,
}

/// Maps request targets onto files below a fixed root.
///
/// Nothing is cached: every request is resolved and stat'd afresh.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    default_document: String,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_default_document(root, DEFAULT_DOCUMENT)
    }

    pub fn with_default_document(root: impl Into<PathBuf>, document: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_document: document.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `uri` to a path under the root.
    ///
    /// Everything from the first `?` on is dropped. A path ending in `/`
    /// gets the default document appended. Paths with a `..` segment are
    /// refused.
    pub fn resolve(&self, uri: &str) -> Result<Target, ServeError> {
        let mut request = ByteBuffer::with_capacity(uri.len() + self.default_document.len());
        request.append(uri.as_bytes());
        let mut path = match request.index_of(b"?") {
            Some(pos) => request.slice(0, pos),
            None => request,
        };

        if path.as_bytes().split(|&b| b == b'/').any(|segment| segment == b"..") {
            return Err(ServeError::Traversal(path.take_string()));
        }

        let directory_like = path.ends_with(b"/");
        if directory_like {
            path.append(self.default_document.as_bytes());
        }
        let uri_path = path.take_string();

        let relative = uri_path.trim_start_matches('/');
        let path = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };

        Ok(Target {
            uri_path,
            path,
            directory_like,
        })
    }

    /// Opens the target, distinguishing "missing" from "not a regular file".
    pub async fn open(&self, target: &Target) -> Result<OpenFile, ServeError> {
        // Checked before opening so that a FIFO cannot stall the open.
        let metadata = tokio::fs::metadata(&target.path)
            .await
            .map_err(|_| ServeError::NotFound(target.path.clone()))?;
        if !metadata.is_file() {
            return Err(ServeError::Forbidden(target.path.clone()));
        }

        let file = tokio::fs::File::open(&target.path)
            .await
            .map_err(|_| ServeError::NotFound(target.path.clone()))?;

        Ok(OpenFile {
            file: file.into_std().await,
            length: metadata.len(),
        })
    }
}
