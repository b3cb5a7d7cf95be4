//! Integration tests for the image pipeline against a mock server.
//!
//! These tests exercise the full resolve → fetch → cache → bind flow with
//! real HTTP requests, verifying the wire-level contract: the API key
//! travels as a query parameter, no custom headers are sent, and the cache
//! keeps network traffic to the minimum.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use covercache::image::{
    HttpImageFetcher, ImageBinding, ImageCache, ImageSink, ImageSource,
};
use covercache::settings::ServerSettings;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COVER_BYTES: &[u8] = b"\xff\xd8\xff\xe0 jpeg-ish cover bytes";

fn settings_for(server: &MockServer) -> Arc<ServerSettings> {
    Arc::new(ServerSettings::new(
        Some(server.uri()),
        Some("XYZ".to_string()),
    ))
}

fn cache_for(server: &MockServer) -> ImageCache {
    ImageCache::new(settings_for(server), Arc::new(HttpImageFetcher::new()))
}

async fn mount_cover(server: &MockServer, cover_path: &str) {
    Mock::given(method("GET"))
        .and(path(cover_path))
        .and(query_param("apikey", "XYZ"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/jpeg")
                .set_body_bytes(COVER_BYTES),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_protected_reference_resolves_and_fetches_end_to_end() {
    let server = MockServer::start().await;
    mount_cover(&server, "/api/v1/MediaCover/Books/42/cover.jpg").await;

    let cache = cache_for(&server);
    let handle = cache.load("MediaCover/Books/42/cover.jpg").await.unwrap();

    assert_eq!(handle.bytes(), COVER_BYTES);
    assert_eq!(handle.content_type(), Some("image/jpeg"));
    assert_eq!(
        handle.url(),
        format!("{}/api/v1/MediaCover/Books/42/cover.jpg?apikey=XYZ", server.uri())
    );
}

#[tokio::test]
async fn test_second_load_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/a.jpg"))
        .and(query_param("apikey", "XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(COVER_BYTES))
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let first = cache.load("MediaCover/a.jpg").await.unwrap();
    let second = cache.load("MediaCover/a.jpg").await.unwrap();

    assert!(first.shares_bytes_with(&second));
    // MockServer verifies expect(1) on drop: exactly one request reached it.
}

#[tokio::test]
async fn test_concurrent_loads_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(COVER_BYTES)
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let (first, second) = tokio::join!(
        cache.load("MediaCover/slow.jpg"),
        cache.load("MediaCover/slow.jpg"),
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.shares_bytes_with(&second));
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached_and_retry_succeeds() {
    let server = MockServer::start().await;
    // First request fails, afterwards the endpoint recovers.
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/flaky.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/flaky.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(COVER_BYTES))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    assert!(cache.load("MediaCover/flaky.jpg").await.is_none());
    assert!(cache.is_empty(), "the failure must not be cached");

    let retried = cache.load("MediaCover/flaky.jpg").await;
    assert!(retried.is_some(), "retry must reach the network and succeed");
}

#[tokio::test]
async fn test_unauthorized_is_an_ordinary_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/secret.jpg"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    assert!(cache.load("MediaCover/secret.jpg").await.is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_image_request_carries_no_api_key_header() {
    let server = MockServer::start().await;
    // A request carrying the API-key header would match this mock first
    // and fail the test; image fetches must authenticate via query only.
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/headerless.jpg"))
        .and(header("X-Api-Key", "XYZ"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/MediaCover/headerless.jpg"))
        .and(query_param("apikey", "XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(COVER_BYTES))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let handle = cache.load("MediaCover/headerless.jpg").await;
    assert!(handle.is_some(), "query-param-only request must succeed");
}

/// Minimal sink capturing the final source for binding round-trips.
#[derive(Default)]
struct CapturingSink {
    source: Option<ImageSource>,
    loading: bool,
}

impl ImageSink for CapturingSink {
    fn set_source(&mut self, source: ImageSource) {
        self.source = Some(source);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

#[tokio::test]
async fn test_binding_displays_fetched_cover_end_to_end() {
    let server = MockServer::start().await;
    mount_cover(&server, "/api/v1/MediaCover/Books/7/cover.jpg").await;

    let sink = Arc::new(Mutex::new(CapturingSink::default()));
    let binding = ImageBinding::new(cache_for(&server), sink.clone());

    binding.update(Some("MediaCover/Books/7/cover.jpg")).await;

    let guard = sink.lock().unwrap();
    assert!(!guard.loading, "loading state must be cleared");
    match guard.source.as_ref().unwrap() {
        ImageSource::Handle(handle) => assert_eq!(handle.bytes(), COVER_BYTES),
        other => panic!("expected a fetched handle, got {other:?}"),
    }
}

#[tokio::test]
async fn test_binding_falls_back_when_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let sink = Arc::new(Mutex::new(CapturingSink::default()));
    let binding = ImageBinding::new(cache_for(&server), sink.clone());

    binding.update(Some("MediaCover/gone.jpg")).await;

    let guard = sink.lock().unwrap();
    assert!(!guard.loading);
    assert!(
        matches!(guard.source.as_ref().unwrap(), ImageSource::Fallback(_)),
        "failed fetch must fall back to the placeholder"
    );
}
