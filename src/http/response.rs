use std::fmt::Write as _;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::http::mime::{MIME_TYPES, MimeTable};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Every response is cacheable for a year. There is no per-file freshness
/// policy and no conditional GET (`ETag`, `If-Modified-Since`).
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

pub const SERVER_NAME: &str = "Garcon 1.0";

/// HTTP status codes produced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use garcon::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// Body sent with an error status.
pub fn error_body(status: StatusCode) -> String {
    format!("http error {}", status.as_u16())
}

/// Formats a timestamp the way the `Date` header expects it,
/// e.g. `Sun, 07 Sep 2014 14:51:17 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Builds response preambles: status line plus a fixed, ordered header set.
///
/// The MIME table is captured at construction and never changes.
#[derive(Debug, Clone, Copy)]
pub struct ResponseComposer {
    mime: &'static MimeTable,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(&MIME_TYPES)
    }
}

impl ResponseComposer {
    pub fn new(mime: &'static MimeTable) -> Self {
        Self { mime }
    }

    /// Preamble for a body of `content_length` bytes. `Content-Type` comes
    /// from the extension of `target_uri` and is left out when unknown.
    pub fn compose(
        &self,
        status: StatusCode,
        content_length: u64,
        date: DateTime<Utc>,
        target_uri: &str,
    ) -> Bytes {
        self.render(status, content_length, date, self.mime.lookup(target_uri))
    }

    /// Preamble for the synthetic plain-text body of an error response.
    pub fn compose_error(&self, status: StatusCode, content_length: u64, date: DateTime<Utc>) -> Bytes {
        self.render(status, content_length, date, Some("text/plain"))
    }

    fn render(
        &self,
        status: StatusCode,
        content_length: u64,
        date: DateTime<Utc>,
        content_type: Option<&str>,
    ) -> Bytes {
        let mut head = String::with_capacity(256);

        // Writing into a String cannot fail.
        let _ = write!(
            head,
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        let _ = write!(head, "Date: {}\r\n", http_date(date));
        let _ = write!(head, "Cache-Control: {}\r\n", CACHE_CONTROL);
        if let Some(content_type) = content_type {
            let _ = write!(head, "Content-Type: {}\r\n", content_type);
        }
        let _ = write!(head, "Content-Length: {}\r\n", content_length);
        head.push_str("Access-Control-Allow-Methods: GET\r\n");
        head.push_str("Access-Control-Allow-Origin: *\r\n");
        let _ = write!(head, "Server: {}\r\n", SERVER_NAME);
        head.push_str("\r\n");

        Bytes::from(head)
    }
}
