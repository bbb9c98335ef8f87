//! Torrentio Client Tests
//!
//! Request URLs, record normalization and failure handling for the
//! Torrentio addon client, against a mockito server.

use mockito::Server;
use kino::api::torrentio::{magnet_uri, RawStream, TorrentioClient};
use kino::api::{IndexerError, StreamIndexer};
use kino::models::{EpisodeRef, OriginKind, QualityTier};

// =============================================================================
// Quality Classification Tests
// =============================================================================

/// Test: "4k" anywhere in the label wins, case-insensitive
#[test]
fn test_classify_4k() {
    assert_eq!(QualityTier::classify("Movie.2022.4K.HDR"), QualityTier::UHD4K);
    assert_eq!(QualityTier::classify("movie 4k remux"), QualityTier::UHD4K);
    // Both tags present: 4K still wins
    assert_eq!(
        QualityTier::classify("Movie 4K 1080p pack"),
        QualityTier::UHD4K
    );
}

/// Test: "1080" without "4k" → 1080p
#[test]
fn test_classify_1080p() {
    assert_eq!(
        QualityTier::classify("Movie.2022.1080p.BluRay"),
        QualityTier::FHD1080p
    );
    assert_eq!(QualityTier::classify("MOVIE 1080P"), QualityTier::FHD1080p);
}

/// Test: anything else is reported as 720p
#[test]
fn test_classify_default_720p() {
    assert_eq!(QualityTier::classify("Movie.2022.720p"), QualityTier::HD720p);
    assert_eq!(QualityTier::classify("Movie.2022.HDCAM"), QualityTier::HD720p);
    assert_eq!(QualityTier::classify(""), QualityTier::HD720p);
}

// =============================================================================
// Normalization Tests
// =============================================================================

/// Test: title lines split into label and size
#[test]
fn test_normalize_title_lines() {
    let raw = RawStream {
        name: Some("Torrentio\n4k".into()),
        title: "The.Batman.2022.2160p.4K.WEB-DL\n👤 89 💾 21.3 GB ⚙️ ThePirateBay".into(),
        url: None,
        info_hash: Some("abc123def456".into()),
    };
    let candidate = raw.normalize().unwrap();

    assert_eq!(candidate.label, "The.Batman.2022.2160p.4K.WEB-DL");
    assert_eq!(candidate.size_label, "👤 89 💾 21.3 GB ⚙️ ThePirateBay");
    assert_eq!(candidate.source, "Torrentio\n4k");
    assert_eq!(candidate.quality_tier, QualityTier::UHD4K);
    assert_eq!(candidate.origin_kind, OriginKind::TorrentMagnet);
    assert!(!candidate.recommended);
}

/// Test: explicit URL is preferred over the info hash
#[test]
fn test_normalize_prefers_url() {
    let raw = RawStream {
        name: None,
        title: "Movie.1080p".into(),
        url: Some("magnet:?xt=urn:btih:fromurl".into()),
        info_hash: Some("fromhash".into()),
    };
    let candidate = raw.normalize().unwrap();

    assert_eq!(candidate.locator, "magnet:?xt=urn:btih:fromurl");
    assert_eq!(candidate.source, "Torrentio");
    assert_eq!(candidate.size_label, "");
}

/// Test: neither URL nor hash → dropped
#[test]
fn test_normalize_drops_unplayable() {
    let raw = RawStream {
        title: "Orphan".into(),
        url: Some(String::new()),
        ..Default::default()
    };
    assert!(raw.normalize().is_none());
}

/// Test: magnet display name is URL-encoded
#[test]
fn test_magnet_uri_encoding() {
    let magnet = magnet_uri("abc123", "Tom & Jerry (1940)");
    assert!(magnet.starts_with("magnet:?xt=urn:btih:abc123&dn="));
    assert!(magnet.contains("dn=Tom%20%26%20Jerry%20%281940%29"));
}

// =============================================================================
// HTTP Request Tests (with mockito)
// =============================================================================

/// Test: movie request URL, order and fields
#[tokio::test]
async fn test_movie_streams_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/movie/tt1877830.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
            "streams": [
                {
                    "name": "Torrentio\n1080p",
                    "title": "The.Batman.2022.1080p.BluRay\n👤 234 💾 4.2 GB",
                    "infoHash": "def789ghi012",
                    "fileIdx": 0
                },
                {
                    "name": "Torrentio\n4k",
                    "title": "The.Batman.2022.4K.WEB-DL\n👤 89 💾 21 GB",
                    "infoHash": "abc123def456",
                    "fileIdx": 0
                }
            ]
        }"#,
        )
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(server.url());
    let streams = client.movie_streams("tt1877830").await.unwrap();

    mock.assert_async().await;

    // Indexer order is kept, not re-sorted by quality
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].quality_tier, QualityTier::FHD1080p);
    assert_eq!(streams[1].quality_tier, QualityTier::UHD4K);
    assert!(streams[0].locator.starts_with("magnet:?xt=urn:btih:def789ghi012&dn="));
    assert_eq!(streams[1].size_label, "👤 89 💾 21 GB");
}

/// Test: series request uses imdb:season:episode
#[tokio::test]
async fn test_series_streams_format() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/series/tt0903747:1:3.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"streams": [{"name": "Torrentio\n720p", "title": "Breaking.Bad.S01E03.720p", "infoHash": "series123hash"}]}"#,
        )
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(server.url());
    let streams = client
        .streams("tt0903747", Some(EpisodeRef { season: 1, episode: 3 }))
        .await
        .unwrap();

    mock.assert_async().await;

    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].quality_tier, QualityTier::HD720p);
    assert!(streams[0].locator.contains("series123hash"));
}

/// Test: records without locator are skipped, the rest kept
#[tokio::test]
async fn test_skips_records_without_locator() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/movie/tt0133093.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"streams": [
                {"name": "Torrentio", "title": "No.Hash.Here"},
                {"name": "Torrentio", "title": "Matrix.1080p", "infoHash": "h1"},
                {"name": "Torrentio", "title": "Matrix.Direct", "url": "https://cdn.example/matrix.mkv"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(format!("{}/", server.url()));
    let streams = client.movie_streams("tt0133093").await.unwrap();

    mock.assert_async().await;

    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].label, "Matrix.1080p");
    assert_eq!(streams[1].locator, "https://cdn.example/matrix.mkv");
}

// =============================================================================
// Edge Case Tests
// =============================================================================

/// Test: empty streams array returns empty Vec, no error
#[tokio::test]
async fn test_handles_empty_streams() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/movie/tt0000000.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"streams": []}"#)
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(server.url());
    let streams = client.movie_streams("tt0000000").await.unwrap();

    mock.assert_async().await;
    assert!(streams.is_empty());
}

/// Test: malformed JSON → QueryFailed, not a panic
#[tokio::test]
async fn test_handles_malformed_response() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/movie/tt9999999.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"streams": not valid json"#)
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(server.url());
    let err = client.movie_streams("tt9999999").await.unwrap_err();

    mock.assert_async().await;

    let IndexerError::QueryFailed(msg) = &err;
    assert!(msg.contains("JSON"), "Expected JSON parse error, got: {}", err);
    assert!(err.to_string().starts_with("Could not load streams from Torrentio"));
}

/// Test: 404 → QueryFailed with the status
#[tokio::test]
async fn test_handles_404_response() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/stream/movie/ttinvalid.json")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let client = TorrentioClient::with_base_url(server.url());
    let result = client.movie_streams("ttinvalid").await;

    mock.assert_async().await;
    assert!(matches!(result, Err(IndexerError::QueryFailed(ref m)) if m.contains("404")));
}

/// Test: unreachable server → QueryFailed
#[tokio::test]
async fn test_handles_network_error() {
    let client = TorrentioClient::with_base_url("http://127.0.0.1:9");
    let result = client.movie_streams("tt1234567").await;

    assert!(matches!(result, Err(IndexerError::QueryFailed(_))));
}
