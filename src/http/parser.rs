//! Incremental HTTP/1.x request parser.
//!
//! The parser never buffers the request. Each call to [`Parser::step`] looks
//! at whatever bytes the caller has and either reports the next event (a
//! fragment of the target, of a header name or of a header value, or a
//! completion marker) or asks for more input. Fragments borrow from the
//! caller's slice, so reassembly is the caller's job.

use thiserror::Error;

use crate::http::request::Method;

/// Upper bound for the request line plus all header lines.
pub const MAX_HEADER_SIZE: usize = 80 * 1024;

const MAX_METHOD_LEN: usize = 16;
const VERSION_LEN: usize = b"HTTP/1.1".len();
const MAX_TRACKED_NAME: usize = 32;
const MAX_TRACKED_VALUE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid request method")]
    InvalidMethod,
    #[error("invalid request target")]
    InvalidUrl,
    #[error("invalid HTTP version")]
    InvalidVersion,
    #[error("invalid header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("Transfer-Encoding is not supported")]
    UnsupportedTransferEncoding,
    #[error("header section exceeds 80 KiB")]
    HeaderTooLarge,
    #[error("connection closed before the request was complete")]
    UnexpectedEof,
}

/// Something the parser recognised in the input.
#[derive(Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// Part of the request target. A target may arrive in several pieces.
    Url(&'a [u8]),
    /// Part of a header name.
    HeaderField(&'a [u8]),
    /// Part of a header value, leading whitespace removed. An empty value is
    /// reported once as an empty fragment.
    HeaderValue(&'a [u8]),
    HeadersComplete,
    MessageComplete,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    Event(Event<'a>),
    /// Every supplied byte was consumed and nothing more can happen until
    /// the caller provides more input.
    NeedMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Method,
    Url,
    Version,
    RequestLineLf,
    HeaderLineStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeaderValueLf,
    HeadersEndLf,
    Body(u64),
    Done,
}

impl State {
    fn in_head(self) -> bool {
        !matches!(self, State::Body(_) | State::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracked {
    ContentLength,
    TransferEncoding,
    Connection,
    Upgrade,
}

/// Watches the few headers that decide message framing.
#[derive(Debug, Default)]
struct Framing {
    name: Vec<u8>,
    value: Vec<u8>,
    tracked: Option<Tracked>,
    content_length: Option<u64>,
    transfer_encoding: bool,
    connection_upgrade: bool,
    upgrade_header: bool,
}

impl Framing {
    fn begin_field(&mut self) {
        self.name.clear();
        self.value.clear();
        self.tracked = None;
    }

    fn push_name(&mut self, bytes: &[u8]) {
        let room = (MAX_TRACKED_NAME + 1).saturating_sub(self.name.len());
        self.name.extend(bytes.iter().take(room));
    }

    fn end_name(&mut self) {
        self.tracked = match self.name.to_ascii_lowercase().as_slice() {
            b"content-length" => Some(Tracked::ContentLength),
            b"transfer-encoding" => Some(Tracked::TransferEncoding),
            b"connection" => Some(Tracked::Connection),
            b"upgrade" => Some(Tracked::Upgrade),
            _ => None,
        };
    }

    fn push_value(&mut self, bytes: &[u8]) {
        if self.tracked.is_some() {
            let room = (MAX_TRACKED_VALUE + 1).saturating_sub(self.value.len());
            self.value.extend(bytes.iter().take(room));
        }
    }

    fn end_line(&mut self) -> Result<(), ParseError> {
        let Some(tracked) = self.tracked.take() else {
            return Ok(());
        };
        let value = self.value.trim_ascii();

        match tracked {
            Tracked::ContentLength => {
                if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
                    return Err(ParseError::InvalidContentLength);
                }
                let length = std::str::from_utf8(value)
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or(ParseError::InvalidContentLength)?;
                match self.content_length {
                    Some(previous) if previous != length => {
                        return Err(ParseError::InvalidContentLength);
                    }
                    _ => self.content_length = Some(length),
                }
            }
            Tracked::TransferEncoding => self.transfer_encoding = true,
            Tracked::Connection => {
                if value
                    .split(|&c| c == b',')
                    .any(|token| token.trim_ascii().eq_ignore_ascii_case(b"upgrade"))
                {
                    self.connection_upgrade = true;
                }
            }
            Tracked::Upgrade => self.upgrade_header = true,
        }
        Ok(())
    }
}

/// Pull-based request parser. One instance parses one request.
#[derive(Debug)]
pub struct Parser {
    state: State,
    token: Vec<u8>,
    method: Option<Method>,
    version: Option<String>,
    url_len: usize,
    value_seen: bool,
    header_bytes: usize,
    framing: Framing,
    upgrade: bool,
    error: Option<ParseError>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            token: Vec::with_capacity(MAX_METHOD_LEN),
            method: None,
            version: None,
            url_len: 0,
            value_seen: false,
            header_bytes: 0,
            framing: Framing::default(),
            upgrade: false,
            error: None,
        }
    }

    /// Advances over `input` until the next event or the end of input.
    ///
    /// Returns how many bytes of `input` were consumed. Once the parser has
    /// failed, every further call returns the same error. After
    /// `MessageComplete` the parser consumes nothing and reports `NeedMore`.
    pub fn step<'a>(&mut self, input: &'a [u8]) -> Result<(usize, Step<'a>), ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let in_head = self.state.in_head();
        let result = self.advance(input).and_then(|(consumed, step)| {
            if in_head {
                self.header_bytes += consumed;
                if self.header_bytes > MAX_HEADER_SIZE {
                    return Err(ParseError::HeaderTooLarge);
                }
            }
            Ok((consumed, step))
        });

        if let Err(err) = &result {
            self.error = Some(err.clone());
        }
        result
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// True when the request asks to switch protocols.
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    pub fn content_length(&self) -> Option<u64> {
        self.framing.content_length
    }

    fn advance<'a>(&mut self, input: &'a [u8]) -> Result<(usize, Step<'a>), ParseError> {
        let mut pos = 0;

        loop {
            match self.state {
                State::Body(0) => {
                    self.state = State::Done;
                    return Ok((pos, Step::Event(Event::MessageComplete)));
                }
                State::Body(remaining) => {
                    let available = (input.len() - pos) as u64;
                    if available == 0 {
                        return Ok((pos, Step::NeedMore));
                    }
                    let take = remaining.min(available);
                    pos += take as usize;
                    self.state = State::Body(remaining - take);
                    continue;
                }
                State::Done => return Ok((pos, Step::NeedMore)),
                _ => {}
            }

            let Some(&b) = input.get(pos) else {
                return Ok((pos, Step::NeedMore));
            };

            match self.state {
                State::Start => {
                    // Stray line breaks ahead of the request line are tolerated.
                    if b == b'\r' || b == b'\n' {
                        pos += 1;
                    } else {
                        self.state = State::Method;
                    }
                }
                State::Method => {
                    if b == b' ' {
                        let method = std::str::from_utf8(&self.token)
                            .ok()
                            .and_then(Method::from_str)
                            .ok_or(ParseError::InvalidMethod)?;
                        self.method = Some(method);
                        self.token.clear();
                        self.state = State::Url;
                        pos += 1;
                    } else if is_token(b) && self.token.len() < MAX_METHOD_LEN {
                        self.token.push(b);
                        pos += 1;
                    } else {
                        return Err(ParseError::InvalidMethod);
                    }
                }
                State::Url => {
                    let span = span_of(&input[pos..], is_url_char);
                    if span > 0 {
                        self.url_len += span;
                        let fragment = &input[pos..pos + span];
                        return Ok((pos + span, Step::Event(Event::Url(fragment))));
                    }
                    if b == b' ' && self.url_len > 0 {
                        self.state = State::Version;
                        pos += 1;
                    } else {
                        return Err(ParseError::InvalidUrl);
                    }
                }
                State::Version => match b {
                    b'\r' => {
                        self.finish_version()?;
                        self.state = State::RequestLineLf;
                        pos += 1;
                    }
                    b'\n' => {
                        self.finish_version()?;
                        self.state = State::HeaderLineStart;
                        pos += 1;
                    }
                    _ if self.token.len() < VERSION_LEN => {
                        self.token.push(b);
                        pos += 1;
                    }
                    _ => return Err(ParseError::InvalidVersion),
                },
                State::RequestLineLf => {
                    if b != b'\n' {
                        return Err(ParseError::InvalidVersion);
                    }
                    self.state = State::HeaderLineStart;
                    pos += 1;
                }
                State::HeaderLineStart => match b {
                    b'\r' => {
                        self.state = State::HeadersEndLf;
                        pos += 1;
                    }
                    b'\n' => {
                        pos += 1;
                        return self.headers_complete(pos);
                    }
                    _ if is_token(b) => {
                        self.framing.begin_field();
                        self.state = State::HeaderField;
                    }
                    // Leading whitespace would be obsolete line folding.
                    _ => return Err(ParseError::InvalidHeader),
                },
                State::HeaderField => {
                    let span = span_of(&input[pos..], is_token);
                    if span > 0 {
                        let fragment = &input[pos..pos + span];
                        self.framing.push_name(fragment);
                        return Ok((pos + span, Step::Event(Event::HeaderField(fragment))));
                    }
                    if b != b':' {
                        return Err(ParseError::InvalidHeader);
                    }
                    self.framing.end_name();
                    self.value_seen = false;
                    self.state = State::HeaderValueStart;
                    pos += 1;
                }
                State::HeaderValueStart => {
                    if b == b' ' || b == b'\t' {
                        pos += 1;
                    } else {
                        self.state = State::HeaderValue;
                    }
                }
                State::HeaderValue => {
                    let span = span_of(&input[pos..], is_value_char);
                    if span > 0 {
                        self.value_seen = true;
                        let fragment = &input[pos..pos + span];
                        self.framing.push_value(fragment);
                        return Ok((pos + span, Step::Event(Event::HeaderValue(fragment))));
                    }
                    if b != b'\r' && b != b'\n' {
                        return Err(ParseError::InvalidHeader);
                    }
                    if !self.value_seen {
                        self.value_seen = true;
                        return Ok((pos, Step::Event(Event::HeaderValue(&[]))));
                    }
                    pos += 1;
                    if b == b'\r' {
                        self.state = State::HeaderValueLf;
                    } else {
                        self.framing.end_line()?;
                        self.state = State::HeaderLineStart;
                    }
                }
                State::HeaderValueLf => {
                    if b != b'\n' {
                        return Err(ParseError::InvalidHeader);
                    }
                    self.framing.end_line()?;
                    self.state = State::HeaderLineStart;
                    pos += 1;
                }
                State::HeadersEndLf => {
                    if b != b'\n' {
                        return Err(ParseError::InvalidHeader);
                    }
                    pos += 1;
                    return self.headers_complete(pos);
                }
                State::Body(_) | State::Done => unreachable!("handled above"),
            }
        }
    }

    fn finish_version(&mut self) -> Result<(), ParseError> {
        let valid = self.token.len() == VERSION_LEN
            && self.token.starts_with(b"HTTP/1.")
            && self.token[VERSION_LEN - 1].is_ascii_digit();
        if !valid {
            return Err(ParseError::InvalidVersion);
        }
        self.version = Some(String::from_utf8_lossy(&self.token).into_owned());
        self.token.clear();
        Ok(())
    }

    fn headers_complete<'a>(&mut self, pos: usize) -> Result<(usize, Step<'a>), ParseError> {
        if self.framing.transfer_encoding {
            return Err(ParseError::UnsupportedTransferEncoding);
        }

        self.upgrade = (self.framing.upgrade_header && self.framing.connection_upgrade)
            || self.method == Some(Method::CONNECT);

        let body = if self.upgrade {
            0
        } else {
            self.framing.content_length.unwrap_or(0)
        };
        self.state = State::Body(body);
        Ok((pos, Step::Event(Event::HeadersComplete)))
    }
}

fn span_of(input: &[u8], accept: fn(u8) -> bool) -> usize {
    input.iter().take_while(|&&b| accept(b)).count()
}

fn is_token(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_url_char(b: u8) -> bool {
    b > b' ' && b != 0x7f
}

fn is_value_char(b: u8) -> bool {
    b == b'\t' || (b >= b' ' && b != 0x7f)
}

