use std::borrow::Cow;

use bytes::BytesMut;

/// Growable append-only byte container.
///
/// Used by the decoder to reassemble the request target and header fragments
/// that arrive split across arbitrary read boundaries.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    inner: BytesMut,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self {
            inner: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.inner.extend_from_slice(bytes);
    }

    /// Empties the buffer but keeps its allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Position of the first occurrence of `needle`, if any.
    ///
    /// An empty needle matches at position 0.
    pub fn index_of(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.inner
            .windows(needle.len())
            .position(|w| w == needle)
    }

    /// Copies `[start, end)` into a new buffer. Out-of-range bounds are clamped.
    pub fn slice(&self, start: usize, end: usize) -> ByteBuffer {
        let end = end.min(self.inner.len());
        let start = start.min(end);
        let mut out = ByteBuffer::with_capacity(end - start);
        out.append(&self.inner[start..end]);
        out
    }

    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.inner.ends_with(suffix)
    }

    /// UTF-8 view of the contents. Invalid sequences are replaced rather than
    /// rejected, so a hostile client cannot make this fail.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.inner)
    }

    /// Takes the contents as an owned string and leaves the buffer empty.
    pub fn take_string(&mut self) -> String {
        let bytes = self.inner.split();
        match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}
