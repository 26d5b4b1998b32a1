use garcon::http::parser::{Event, ParseError, Parser, Step};
use garcon::http::request::Method;

/// Runs the parser over `chunks` and records events as strings.
fn run(chunks: &[&[u8]]) -> (Parser, Result<Vec<String>, ParseError>) {
    let mut parser = Parser::new();
    let mut out = Vec::new();

    for chunk in chunks {
        let mut offset = 0;
        loop {
            let (n, step) = match parser.step(&chunk[offset..]) {
                Ok(progress) => progress,
                Err(e) => return (parser, Err(e)),
            };
            offset += n;
            match step {
                Step::NeedMore => break,
                Step::Event(Event::Url(f)) => out.push(format!("url:{}", String::from_utf8_lossy(f))),
                Step::Event(Event::HeaderField(f)) => {
                    out.push(format!("field:{}", String::from_utf8_lossy(f)))
                }
                Step::Event(Event::HeaderValue(f)) => {
                    out.push(format!("value:{}", String::from_utf8_lossy(f)))
                }
                Step::Event(Event::HeadersComplete) => out.push("headers".to_string()),
                Step::Event(Event::MessageComplete) => {
                    out.push("complete".to_string());
                    return (parser, Ok(out));
                }
            }
        }
    }

    (parser, Ok(out))
}

#[test]
fn test_parse_simple_get_request() {
    let (parser, events) = run(&[b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"]);

    assert_eq!(
        events.unwrap(),
        vec!["url:/", "field:Host", "value:example.com", "headers", "complete"]
    );
    assert_eq!(parser.method(), Some(Method::GET));
    assert_eq!(parser.version(), Some("HTTP/1.1"));
    assert!(parser.is_complete());
}

#[test]
fn test_fragments_follow_chunk_boundaries() {
    let (_, events) = run(&[b"GET /in", b"dex.html HTTP/1.0\r\nHo", b"st: a", b"b\r\n\r\n"]);

    assert_eq!(
        events.unwrap(),
        vec![
            "url:/in",
            "url:dex.html",
            "field:Ho",
            "field:st",
            "value:a",
            "value:b",
            "headers",
            "complete"
        ]
    );
}

#[test]
fn test_one_byte_at_a_time() {
    let request = b"GET /a.txt HTTP/1.1\r\nHost: x\r\n\r\n";
    let chunks: Vec<&[u8]> = request.chunks(1).collect();
    let (parser, events) = run(&chunks);

    assert!(parser.is_complete());
    assert_eq!(events.unwrap().last().map(String::as_str), Some("complete"));
}

#[test]
fn test_incomplete_request_needs_more() {
    let (parser, events) = run(&[b"GET / HTTP/1.1\r\nHost: example.com\r\n"]);

    assert!(events.is_ok());
    assert!(!parser.is_complete());
}

#[test]
fn test_bare_lf_line_endings() {
    let (parser, events) = run(&[b"GET / HTTP/1.1\nHost: x\n\n"]);

    assert!(events.is_ok());
    assert!(parser.is_complete());
}

#[test]
fn test_leading_whitespace_stripped_from_value() {
    let (_, events) = run(&[b"GET / HTTP/1.1\r\nAccept: \t */*\r\n\r\n"]);

    assert!(events.unwrap().contains(&"value:*/*".to_string()));
}

#[test]
fn test_empty_value_reported_once() {
    let (_, events) = run(&[b"GET / HTTP/1.1\r\nX-Empty:\r\nHost: x\r\n\r\n"]);

    assert_eq!(
        events.unwrap(),
        vec!["url:/", "field:X-Empty", "value:", "field:Host", "value:x", "headers", "complete"]
    );
}

#[test]
fn test_parse_invalid_http_method() {
    let (_, events) = run(&[b"INVALID / HTTP/1.1\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_lowercase_method_is_invalid() {
    let (_, events) = run(&[b"get / HTTP/1.1\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::OPTIONS),
        ("TRACE", Method::TRACE),
        ("PATCH", Method::PATCH),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} / HTTP/1.1\r\n\r\n", method_str);
        let (parser, events) = run(&[req.as_bytes()]);
        assert!(events.is_ok(), "{} should parse", method_str);
        assert_eq!(parser.method(), Some(expected_method));
    }
}

#[test]
fn test_parse_malformed_header() {
    let (_, events) = run(&[b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::InvalidHeader);
}

#[test]
fn test_obsolete_line_folding_rejected() {
    let (_, events) = run(&[b"GET / HTTP/1.1\r\nX-A: 1\r\n  continued\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::InvalidHeader);
}

#[test]
fn test_invalid_version() {
    let (_, events) = run(&[b"GET / HTTP/2.0\r\n\r\n"]);
    assert_eq!(events.unwrap_err(), ParseError::InvalidVersion);

    let (_, events) = run(&[b"GET / FOO\r\n\r\n"]);
    assert_eq!(events.unwrap_err(), ParseError::InvalidVersion);
}

#[test]
fn test_missing_target_is_invalid() {
    let (_, events) = run(&[b"GET  HTTP/1.1\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::InvalidUrl);
}

#[test]
fn test_body_is_consumed_before_completion() {
    let (parser, events) = run(&[b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel", b"lo"]);

    assert_eq!(events.unwrap().last().map(String::as_str), Some("complete"));
    assert_eq!(parser.content_length(), Some(5));
    assert_eq!(parser.method(), Some(Method::POST));
}

#[test]
fn test_partial_body_is_incomplete() {
    let (parser, events) = run(&[b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello"]);

    assert!(events.is_ok());
    assert!(!parser.is_complete());
}

#[test]
fn test_invalid_content_length() {
    let (_, events) = run(&[b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n"]);
    assert_eq!(events.unwrap_err(), ParseError::InvalidContentLength);

    let (_, events) = run(&[b"POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n"]);
    assert_eq!(events.unwrap_err(), ParseError::InvalidContentLength);
}

#[test]
fn test_transfer_encoding_unsupported() {
    let (_, events) = run(&[b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n"]);

    assert_eq!(events.unwrap_err(), ParseError::UnsupportedTransferEncoding);
}

#[test]
fn test_upgrade_detection() {
    let (parser, events) = run(&[
        b"GET /chat HTTP/1.1\r\nConnection: keep-alive, Upgrade\r\nUpgrade: websocket\r\n\r\n",
    ]);
    assert!(events.is_ok());
    assert!(parser.is_complete());
    assert!(parser.is_upgrade());

    let (parser, _) = run(&[b"GET / HTTP/1.1\r\nUpgrade: websocket\r\n\r\n"]);
    assert!(!parser.is_upgrade());
}

#[test]
fn test_header_section_limit() {
    let mut request = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
    request.extend(std::iter::repeat_n(b'a', 90 * 1024));
    let (_, events) = run(&[&request]);

    assert_eq!(events.unwrap_err(), ParseError::HeaderTooLarge);
}

#[test]
fn test_error_is_sticky() {
    let mut parser = Parser::new();
    assert!(parser.step(b"BOGUS / HTTP/1.1\r\n").is_err());
    assert_eq!(parser.step(b"GET / HTTP/1.1\r\n\r\n").unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_trailing_bytes_are_not_consumed() {
    let mut parser = Parser::new();
    let input = b"GET / HTTP/1.1\r\n\r\nGET /next HTTP/1.1\r\n\r\n";
    let mut offset = 0;
    loop {
        let (n, step) = parser.step(&input[offset..]).unwrap();
        offset += n;
        if step == Step::Event(Event::MessageComplete) {
            break;
        }
    }

    assert_eq!(offset, b"GET / HTTP/1.1\r\n\r\n".len());
    assert_eq!(parser.step(&input[offset..]).unwrap(), (0, Step::NeedMore));
}
