//! Error types for request serving

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::response::StatusCode;

/// Why a file could not be served.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Nothing could be opened at the resolved path
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a regular file
    #[error("not a regular file: {}", .0.display())]
    Forbidden(PathBuf),

    /// The request path tried to climb out of the document root
    #[error("path escapes the document root: {0}")]
    Traversal(String),

    /// Transfer failed after the preamble was sent
    #[error("transfer failed: {0}")]
    Io(#[from] io::Error),
}

impl ServeError {
    /// Status to answer with, or `None` once the preamble is already on the
    /// wire and the only option left is to drop the connection.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServeError::NotFound(_) => Some(StatusCode::NotFound),
            ServeError::Forbidden(_) | ServeError::Traversal(_) => Some(StatusCode::Forbidden),
            ServeError::Io(_) => None,
        }
    }
}
