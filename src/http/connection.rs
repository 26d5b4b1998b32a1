use std::future::Future;
use std::io;
use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::access_log::AccessEntry;
use crate::error::ServeError;
use crate::files::send_file;
use crate::http::decoder::RequestDecoder;
use crate::http::request::Request;
use crate::http::response::{StatusCode, error_body};
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

/// Size of each socket read.
const READ_CHUNK: usize = 1024;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    received_at: DateTime<Utc>,
    decoder: RequestDecoder,
    ctx: Arc<ServerContext>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Responding(Request),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ServerContext>) -> Self {
        Self {
            stream,
            peer,
            received_at: Utc::now(),
            decoder: RequestDecoder::new(),
            ctx,
            state: ConnectionState::Reading,
        }
    }

    /// Serves one request and closes the socket, whatever happened.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.close();
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => self.state = ConnectionState::Responding(req),
                    None => self.state = ConnectionState::Closed,
                },

                ConnectionState::Responding(req) => {
                    self.respond(&req).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Reads until the decoder has a complete request or gives up on one.
    ///
    /// The deadline covers the whole request, so a client trickling bytes
    /// cannot hold the connection open. `None` means the peer went away
    /// without sending anything.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        with_deadline(self.ctx.timeout, self.receive())
            .await
            .context("reading request")
    }

    async fn receive(&mut self) -> anyhow::Result<Option<Request>> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = self.stream.read(&mut chunk).await?;

            if n == 0 {
                if self.decoder.is_empty() {
                    return Ok(None);
                }
                self.decoder.finish();
                return Ok(Some(self.take_request()));
            }

            match self.decoder.feed(&chunk[..n]) {
                Ok(_) if self.decoder.is_complete() => return Ok(Some(self.take_request())),
                Ok(_) => {}
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "Malformed request");
                    return Ok(Some(self.take_request()));
                }
            }
        }
    }

    async fn respond(&mut self, req: &Request) -> anyhow::Result<()> {
        if req.parse_failed {
            self.send_error(req, StatusCode::BadRequest).await
        } else if !req.is_get() {
            self.send_error(req, StatusCode::MethodNotAllowed).await
        } else if req.upgrade {
            debug!(peer = %self.peer, uri = %req.uri, "Protocol upgrade not supported, dropping");
            Ok(())
        } else {
            self.serve_file(req).await
        }
    }

    async fn serve_file(&mut self, req: &Request) -> anyhow::Result<()> {
        let ctx = Arc::clone(&self.ctx);

        let target = match ctx.resolver.resolve(&req.uri) {
            Ok(target) => target,
            Err(e) => return self.refuse(req, e).await,
        };
        let file = match ctx.resolver.open(&target).await {
            Ok(file) => file,
            Err(e) => return self.refuse(req, e).await,
        };

        let head = ctx.composer.compose(
            StatusCode::Ok,
            file.length,
            req.received_at,
            &target.uri_path,
        );
        let mut writer = ResponseWriter::new(head);
        with_deadline(ctx.timeout, writer.write_to_stream(&mut self.stream))
            .await
            .context("writing response headers")?;

        // Headers are committed; from here a failure can only be logged.
        let sent = send_file(&mut self.stream, &file.file, file.length, ctx.timeout)
            .await
            .map_err(ServeError::Io)
            .with_context(|| format!("sending {}", target.path.display()))?;

        debug!(peer = %self.peer, path = %target.path.display(), bytes = sent, "File sent");
        ctx.access_log.record(&AccessEntry::from_request(req, StatusCode::Ok));
        Ok(())
    }

    async fn refuse(&mut self, req: &Request, err: ServeError) -> anyhow::Result<()> {
        debug!(peer = %self.peer, error = %err, "Cannot serve request");
        match err.status() {
            Some(status) => self.send_error(req, status).await,
            None => Err(err.into()),
        }
    }

    async fn send_error(&mut self, req: &Request, status: StatusCode) -> anyhow::Result<()> {
        let body = error_body(status);
        let head = self
            .ctx
            .composer
            .compose_error(status, body.len() as u64, req.received_at);

        let entry = if status == StatusCode::BadRequest {
            AccessEntry::bad_request(req)
        } else {
            AccessEntry::from_request(req, status)
        };

        let mut writer = ResponseWriter::with_body(head, Bytes::from(body));
        let written = with_deadline(self.ctx.timeout, writer.write_to_stream(&mut self.stream)).await;
        self.ctx.access_log.record(&entry);

        written.with_context(|| format!("writing {} response", status.as_u16()))
    }

    fn take_request(&mut self) -> Request {
        self.decoder.take_request(self.peer.ip(), self.received_at)
    }

    fn close(self) {
        match self.stream.into_std() {
            Ok(stream) => {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    if e.kind() != io::ErrorKind::NotConnected {
                        debug!(peer = %self.peer, error = %e, "Socket shutdown failed");
                    }
                }
            }
            Err(e) => warn!(peer = %self.peer, error = %e, "Cannot detach socket for shutdown"),
        }
    }
}

/// Runs `fut` under the connection deadline, if there is one.
async fn with_deadline<T, E, F>(limit: Option<Duration>, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connection deadline elapsed").into()),
        },
        None => fut.await.map_err(Into::into),
    }
}
