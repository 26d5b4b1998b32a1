//! HTTP/1.x request handling.
//!
//! Each accepted socket carries exactly one request and is closed after the
//! response. There is no keep-alive, pipelining or chunked encoding.
//!
//! # Architecture
//!
//! - **`buffer`**: append-only byte buffer used to reassemble fragments
//! - **`parser`**: pull-based parser that reports fragments and completion
//! - **`decoder`**: turns parser fragments into a complete [`request::Request`]
//! - **`request`**: request representation and ordered headers
//! - **`response`**: status codes and the response preamble composer
//! - **`mime`**: MIME type detection based on file extensions
//! - **`writer`**: writes preambles and small bodies to the client
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Feed 1 KiB chunks to the decoder
//!        └──────┬──────┘
//!               │ Complete, parse error, or peer closed mid-request
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← 400 / 405 / drop upgrade / serve file
//!        └──────┬───────────┘
//!               │
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ← Shutdown both directions, always
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use garcon::access_log::AccessLog;
//! use garcon::http::connection::Connection;
//! use garcon::server::ServerContext;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (log, _writer) = AccessLog::stdout();
//!     let ctx = Arc::new(ServerContext::new("/srv/www", log));
//!     let listener = TcpListener::bind("127.0.0.1:8888").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let ctx = Arc::clone(&ctx);
//!         tokio::spawn(async move {
//!             if let Err(e) = Connection::new(socket, peer, ctx).run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod decoder;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
