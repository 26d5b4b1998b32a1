//! Garcon - static file server
//!
//! Serves files below a root directory over HTTP/1.x, one request per
//! connection, with zero-copy transfers and a Combined Log Format access log.

pub mod access_log;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod server;
