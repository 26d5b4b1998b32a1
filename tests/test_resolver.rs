use std::path::PathBuf;

use garcon::error::ServeError;
use garcon::files::{DEFAULT_DOCUMENT, Resolver};
use garcon::http::response::StatusCode;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("garcon-resolver-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_query_string_is_stripped() {
    let resolver = Resolver::new("/srv/www");

    let with_query = resolver.resolve("/a.txt?x=1").unwrap();
    let without = resolver.resolve("/a.txt").unwrap();

    assert_eq!(with_query.path, without.path);
    assert_eq!(with_query.path, PathBuf::from("/srv/www/a.txt"));
    assert_eq!(with_query.uri_path, "/a.txt");
}

#[test]
fn test_directory_like_gets_default_document() {
    let resolver = Resolver::new("/srv/www");

    let root = resolver.resolve("/").unwrap();
    assert!(root.directory_like);
    assert_eq!(root.path, PathBuf::from("/srv/www").join(DEFAULT_DOCUMENT));
    assert_eq!(root.uri_path, "/index.html");

    let nested = resolver.resolve("/docs/?page=2").unwrap();
    assert!(nested.directory_like);
    assert_eq!(nested.path, PathBuf::from("/srv/www/docs/index.html"));
}

#[test]
fn test_custom_default_document() {
    let resolver = Resolver::with_default_document("/srv/www", "home.htm");

    assert_eq!(
        resolver.resolve("/").unwrap().path,
        PathBuf::from("/srv/www/home.htm")
    );
}

#[test]
fn test_parent_segments_are_refused() {
    let resolver = Resolver::new("/srv/www");

    let err = resolver.resolve("/../etc/passwd").unwrap_err();
    assert!(matches!(err, ServeError::Traversal(_)));
    assert_eq!(err.status(), Some(StatusCode::Forbidden));

    assert!(resolver.resolve("/a/../../b").is_err());
    // A dotted file name is not a parent segment.
    assert!(resolver.resolve("/..hidden").is_ok());
}

#[test]
fn test_leading_slashes_stay_under_root() {
    let resolver = Resolver::new("/srv/www");

    assert_eq!(
        resolver.resolve("//etc/passwd").unwrap().path,
        PathBuf::from("/srv/www/etc/passwd")
    );
}

#[tokio::test]
async fn test_open_regular_file() {
    let dir = scratch_dir("regular");
    std::fs::write(dir.join("hello.txt"), b"hello world").unwrap();
    let resolver = Resolver::new(&dir);

    let target = resolver.resolve("/hello.txt").unwrap();
    let opened = resolver.open(&target).await.unwrap();

    assert_eq!(opened.length, 11);
}

#[tokio::test]
async fn test_open_missing_is_not_found() {
    let dir = scratch_dir("missing");
    let resolver = Resolver::new(&dir);

    let target = resolver.resolve("/nope.txt").unwrap();
    let err = resolver.open(&target).await.unwrap_err();

    assert!(matches!(err, ServeError::NotFound(_)));
    assert_eq!(err.status(), Some(StatusCode::NotFound));
}

#[tokio::test]
async fn test_open_directory_is_forbidden() {
    let dir = scratch_dir("directory");
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    let resolver = Resolver::new(&dir);

    let target = resolver.resolve("/sub").unwrap();
    let err = resolver.open(&target).await.unwrap_err();

    assert!(matches!(err, ServeError::Forbidden(_)));
    assert_eq!(err.status(), Some(StatusCode::Forbidden));
}
