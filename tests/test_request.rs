use garcon::http::request::{Headers, Method, RequestBuilder};

#[test]
fn test_request_header_retrieval() {
    let req = RequestBuilder::new()
        .method(Some(Method::GET))
        .uri("/")
        .header("Host", "example.com")
        .header("User-Agent", "test-client")
        .build();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.user_agent(), Some("test-client"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_path_strips_query() {
    let req = RequestBuilder::new()
        .method(Some(Method::GET))
        .uri("/search?q=rust?again")
        .build();

    assert_eq!(req.path(), "/search");
    assert_eq!(req.uri, "/search?q=rust?again");
}

#[test]
fn test_request_builder_defaults() {
    let req = RequestBuilder::new()
        .method(Some(Method::POST))
        .uri("/upload")
        .build();

    assert_eq!(req.version, "HTTP/1.1");
    assert!(!req.is_get());
    assert!(!req.upgrade);
    assert!(!req.parse_failed);
    assert!(req.headers.is_empty());
}

#[test]
fn test_request_builder_unparsed_defaults() {
    let req = RequestBuilder::new().parse_failed(true).build();

    assert_eq!(req.method, None);
    assert_eq!(req.uri, "");
    assert_eq!(req.version, "HTTP/1.1");
    assert!(req.parse_failed);
    assert!(!req.is_get());
}

#[test]
fn test_method_round_trip_names() {
    assert_eq!(Method::GET.as_str(), "GET");
    assert_eq!(Method::from_str("CONNECT"), Some(Method::CONNECT));
    assert_eq!(Method::from_str("BREW"), None);
}

#[test]
fn test_headers_keep_arrival_order() {
    let mut headers = Headers::new();
    headers.insert("B", "1");
    headers.insert("A", "2");
    headers.insert("B", "3");

    let pairs: Vec<(&str, &str)> = headers.iter().collect();
    assert_eq!(pairs, vec![("B", "3"), ("A", "2")]);
    assert!(headers.contains_key("A"));
    assert!(!headers.contains_key("a"));
}
