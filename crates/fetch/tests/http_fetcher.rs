//! Integration tests for the HTTP media fetcher against a mock gateway.

use assert_matches::assert_matches;
use reelq_core::collaborators::{FetchError, MediaFetcher};
use reelq_core::media::{MediaKind, MediaSource};
use reelq_fetch::HttpFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway_returning(status: u16, content_type: &str, body: &[u8]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ABC123"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", content_type)
                .set_body_bytes(body.to_vec()),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn video_is_staged_in_scratch_dir_and_cleaned_on_drop() {
    let server = gateway_returning(200, "video/mp4", b"MP4DATA").await;
    let scratch = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(server.uri(), scratch.path()).unwrap();

    let media = fetcher.fetch("ABC123").await.unwrap();
    assert_eq!(media.kind, MediaKind::Video);

    let staged = match &media.source {
        MediaSource::Scratch(file) => file.path().to_path_buf(),
        other => panic!("expected scratch file, got {other:?}"),
    };
    assert!(staged.starts_with(scratch.path()));
    assert_eq!(staged.extension().unwrap(), "mp4");
    assert_eq!(media.source.read().await.unwrap(), b"MP4DATA");

    drop(media);
    assert!(!staged.exists());
}

#[tokio::test]
async fn image_content_type_yields_image() {
    let server = gateway_returning(200, "image/jpeg", b"JPEG").await;
    let scratch = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(server.uri(), scratch.path()).unwrap();

    let media = fetcher.fetch("ABC123").await.unwrap();
    assert_eq!(media.kind, MediaKind::Image);
}

#[tokio::test]
async fn not_found_and_forbidden_are_unavailable() {
    for status in [403, 404, 410] {
        let server = gateway_returning(status, "text/plain", b"nope").await;
        let scratch = tempfile::tempdir().unwrap();
        let fetcher = HttpFetcher::new(server.uri(), scratch.path()).unwrap();

        assert_matches!(
            fetcher.fetch("ABC123").await,
            Err(FetchError::Unavailable(_)),
            "status {status}"
        );
    }
}

#[tokio::test]
async fn server_error_is_generic_failure() {
    let server = gateway_returning(500, "text/plain", b"boom").await;
    let scratch = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(server.uri(), scratch.path()).unwrap();

    assert_matches!(fetcher.fetch("ABC123").await, Err(FetchError::Other(_)));
}

#[tokio::test]
async fn unsupported_content_type_is_generic_failure() {
    let server = gateway_returning(200, "text/html", b"<html>").await;
    let scratch = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(server.uri(), scratch.path()).unwrap();

    assert_matches!(fetcher.fetch("ABC123").await, Err(FetchError::Other(_)));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
