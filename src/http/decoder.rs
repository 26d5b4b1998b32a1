use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::http::buffer::ByteBuffer;
use crate::http::parser::{Event, ParseError, Parser, Step};
use crate::http::request::{Headers, Method, Request, RequestBuilder};

/// Reassembles one request from transport chunks of any size.
///
/// The target is rebuilt by concatenating URL fragments. Header names and
/// values are staged until the next header name starts (or the header
/// section ends) and only then committed, so a name or value split across
/// reads is never stored half-finished.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    parser: Parser,
    url: ByteBuffer,
    headers: Headers,
    field: ByteBuffer,
    value: ByteBuffer,
    value_started: bool,
    received: usize,
    complete: bool,
    error: Option<ParseError>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk to the parser.
    ///
    /// Returns the number of bytes consumed. Bytes following a complete
    /// request are left unconsumed. Once the request is complete or the
    /// parse has failed, further chunks are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize, ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.complete {
            return Ok(0);
        }

        self.received += chunk.len();
        let mut offset = 0;

        loop {
            let (consumed, step) = match self.parser.step(&chunk[offset..]) {
                Ok(progress) => progress,
                Err(err) => {
                    self.error = Some(err.clone());
                    return Err(err);
                }
            };
            offset += consumed;

            match step {
                Step::NeedMore => return Ok(offset),
                Step::Event(Event::Url(fragment)) => self.url.append(fragment),
                Step::Event(Event::HeaderField(fragment)) => {
                    if self.value_started {
                        self.commit_header();
                    }
                    self.field.append(fragment);
                }
                Step::Event(Event::HeaderValue(fragment)) => {
                    self.value_started = true;
                    self.value.append(fragment);
                }
                Step::Event(Event::HeadersComplete) => self.commit_header(),
                Step::Event(Event::MessageComplete) => {
                    self.commit_header();
                    self.complete = true;
                    return Ok(offset);
                }
            }
        }
    }

    /// Records that the peer closed the stream. An unfinished request
    /// becomes a parse failure.
    pub fn finish(&mut self) {
        if !self.complete && self.error.is_none() {
            self.error = Some(ParseError::UnexpectedEof);
        }
    }

    /// The logical request is complete. This is independent of whether the
    /// transport has reached end of stream.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn parse_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Nothing has been fed yet.
    pub fn is_empty(&self) -> bool {
        self.received == 0
    }

    pub fn method(&self) -> Option<Method> {
        self.parser.method()
    }

    /// Request target, available once the request is complete.
    pub fn target(&self) -> Option<&[u8]> {
        self.complete.then(|| self.url.as_bytes())
    }

    /// Committed headers, available once the request is complete.
    pub fn headers(&self) -> Option<&Headers> {
        self.complete.then_some(&self.headers)
    }

    /// Moves what has been decoded into a [`Request`] and resets the decoder.
    pub fn take_request(&mut self, client_address: IpAddr, received_at: DateTime<Utc>) -> Request {
        let request = RequestBuilder::new()
            .method(self.parser.method())
            .uri(self.url.take_string())
            .version(self.parser.version())
            .headers(std::mem::take(&mut self.headers))
            .client_address(client_address)
            .received_at(received_at)
            .upgrade(self.parser.is_upgrade())
            .parse_failed(self.error.is_some() || !self.complete)
            .build();
        self.reset();
        request
    }

    /// Clears every trace of the previous request so the decoder can be
    /// reused for another connection.
    pub fn reset(&mut self) {
        self.parser = Parser::new();
        self.url.clear();
        self.headers.clear();
        self.field.clear();
        self.value.clear();
        self.value_started = false;
        self.received = 0;
        self.complete = false;
        self.error = None;
    }

    fn commit_header(&mut self) {
        if self.field.is_empty() {
            return;
        }
        let name = self.field.take_string();
        let mut value = self.value.take_string();
        value.truncate(value.trim_end().len());
        self.headers.insert(name, value);
        self.value_started = false;
    }
}
