//! Access log in (a subset of) Apache Combined Log Format.
//!
//! Connections format their own line and hand it to a single writer task
//! over a channel, so lines from concurrent connections never interleave.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::http::request::Request;
use crate::http::response::StatusCode;

/// One completed request, as it will appear in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    pub client: IpAddr,
    pub time: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub status: u16,
    pub user_agent: Option<String>,
}

impl AccessEntry {
    pub fn from_request(request: &Request, status: StatusCode) -> Self {
        Self {
            client: request.client_address,
            time: request.received_at,
            method: request
                .method
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            uri: request.uri.clone(),
            status: status.as_u16(),
            user_agent: request.user_agent().map(str::to_string),
        }
    }

    /// Entry for a request that could not be parsed. Nothing the client sent
    /// is echoed back into the log.
    pub fn bad_request(request: &Request) -> Self {
        Self {
            client: request.client_address,
            time: request.received_at,
            method: String::new(),
            uri: "BAD REQUEST".to_string(),
            status: StatusCode::BadRequest.as_u16(),
            user_agent: Some(String::new()),
        }
    }

    /// `<ip> - - [<time>] <METHOD> <URI> <status> "<User-Agent>"`, no newline.
    pub fn format_line(&self) -> String {
        format!(
            "{} - - [{}] {} {} {} \"{}\"",
            self.client,
            self.time.format("%Y-%m-%dT%H:%M:%S%z"),
            self.method,
            self.uri,
            self.status,
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }
}

/// Cloneable handle to the access log writer.
#[derive(Debug, Clone)]
pub struct AccessLog {
    tx: mpsc::UnboundedSender<String>,
}

impl AccessLog {
    /// Starts the writer task on `sink`. The task ends once every handle has
    /// been dropped and the queue is drained.
    pub fn spawn<W>(mut sink: W) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let handle = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = sink.write_all(line.as_bytes()).await {
                    tracing::error!(error = %e, "Failed to write access log");
                    continue;
                }
                if let Err(e) = sink.flush().await {
                    tracing::error!(error = %e, "Failed to flush access log");
                }
            }
        });

        (Self { tx }, handle)
    }

    pub fn stdout() -> (Self, JoinHandle<()>) {
        Self::spawn(tokio::io::stdout())
    }

    pub fn record(&self, entry: &AccessEntry) {
        let mut line = entry.format_line();
        line.push('\n');
        if self.tx.send(line).is_err() {
            tracing::warn!("Access log writer has stopped, dropping entry");
        }
    }
}
