use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, Utc};

/// HTTP request methods recognised by the parser.
///
/// Only GET is served. The others parse cleanly so that they can be answered
/// with 405 Method Not Allowed instead of 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive, as method tokens are.
    ///
    /// # Example
    ///
    /// ```
    /// # use garcon::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "CONNECT" => Some(Method::CONNECT),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

/// Request headers in arrival order.
///
/// Names are kept exactly as received (no case folding). Inserting a name
/// that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A request as seen by the connection that received it.
///
/// Lives only as long as its connection. `method` is `None` when parsing
/// failed before the method token was recognised.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method, if one was parsed
    pub method: Option<Method>,
    /// The raw request target, query string included (e.g. "/a.txt?x=1")
    pub uri: String,
    /// HTTP version, e.g. "HTTP/1.1"
    pub version: String,
    /// Request headers, last write wins on duplicate names
    pub headers: Headers,
    /// Peer address of the connection
    pub client_address: IpAddr,
    /// When the connection was accepted
    pub received_at: DateTime<Utc>,
    /// The client asked to switch protocols
    pub upgrade: bool,
    /// The byte stream could not be parsed as a request
    pub parse_failed: bool,
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }

    /// The request target with any query string removed.
    pub fn path(&self) -> &str {
        match self.uri.find('?') {
            Some(pos) => &self.uri[..pos],
            None => &self.uri,
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == Some(Method::GET)
    }
}

/// Builder for constructing Request objects.
///
/// Anything not set falls back to what an unparseable request would carry:
/// no method, an empty target and `HTTP/1.1`.
pub struct RequestBuilder {
    method: Option<Method>,
    uri: String,
    version: Option<String>,
    headers: Headers,
    client_address: IpAddr,
    received_at: Option<DateTime<Utc>>,
    upgrade: bool,
    parse_failed: bool,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: String::new(),
            version: None,
            headers: Headers::new(),
            client_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            received_at: None,
            upgrade: false,
            parse_failed: false,
        }
    }

    pub fn method(mut self, method: Option<Method>) -> Self {
        self.method = method;
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn version(mut self, version: Option<&str>) -> Self {
        self.version = version.map(str::to_string);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn client_address(mut self, addr: IpAddr) -> Self {
        self.client_address = addr;
        self
    }

    pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = Some(at);
        self
    }

    pub fn upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    pub fn parse_failed(mut self, failed: bool) -> Self {
        self.parse_failed = failed;
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            client_address: self.client_address,
            received_at: self.received_at.unwrap_or_else(Utc::now),
            upgrade: self.upgrade,
            parse_failed: self.parse_failed,
        }
    }
}
