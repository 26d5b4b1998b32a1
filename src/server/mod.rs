//! Listening socket and state shared by every connection.

pub mod context;
pub mod listener;

pub use context::ServerContext;
pub use listener::Server;
