//! Torrentio addon client
//!
//! Fetches raw stream records from the Torrentio Stremio addon and
//! normalizes them into [`StreamCandidate`]s.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{EpisodeRef, OriginKind, QualityTier, StreamCandidate};

/// Indexer query errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexerError {
    #[error("Could not load streams from Torrentio: {0}")]
    QueryFailed(String),
}

/// Torrentio API response
#[derive(Debug, Deserialize)]
struct TorrentioResponse {
    #[serde(default)]
    streams: Vec<RawStream>,
}

/// Individual stream record as Torrentio sends it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStream {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "infoHash", default)]
    pub info_hash: Option<String>,
}

impl RawStream {
    /// Convert an indexer record into a candidate.
    ///
    /// Returns `None` when the record carries neither a URL nor an info hash.
    pub fn normalize(&self) -> Option<StreamCandidate> {
        let mut lines = self.title.lines();
        let label = lines.next().unwrap_or_default().to_string();
        let size_label = lines.next().unwrap_or_default().to_string();

        let locator = match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => {
                let hash = self.info_hash.as_deref().filter(|h| !h.is_empty())?;
                magnet_uri(hash, &label)
            }
        };

        Some(StreamCandidate {
            source: self
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Torrentio".to_string()),
            quality_tier: QualityTier::classify(&label),
            label,
            size_label,
            locator,
            origin_kind: OriginKind::TorrentMagnet,
            recommended: false,
        })
    }
}

/// Build a magnet URI from an info hash and display name
pub fn magnet_uri(info_hash: &str, display_name: &str) -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash,
        urlencoding::encode(display_name)
    )
}

/// Source of torrent candidates for a title
#[async_trait]
pub trait StreamIndexer: Send + Sync {
    /// Query candidates for an IMDB id, optionally for a single episode
    async fn streams(
        &self,
        imdb_id: &str,
        episode: Option<EpisodeRef>,
    ) -> Result<Vec<StreamCandidate>, IndexerError>;
}

/// Torrentio addon client
pub struct TorrentioClient {
    base_url: String,
    client: reqwest::Client,
}

impl TorrentioClient {
    /// Create a new Torrentio client with default settings
    pub fn new() -> Self {
        Self::with_base_url("https://torrentio.strem.fun")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(15))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Get streams for a movie by IMDB ID
    pub async fn movie_streams(&self, imdb_id: &str) -> Result<Vec<StreamCandidate>, IndexerError> {
        let url = format!("{}/stream/movie/{}.json", self.base_url, imdb_id);
        self.fetch_streams(&url).await
    }

    /// Get streams for a TV episode by IMDB ID and episode info
    pub async fn episode_streams(
        &self,
        imdb_id: &str,
        season: u16,
        episode: u16,
    ) -> Result<Vec<StreamCandidate>, IndexerError> {
        let url = format!(
            "{}/stream/series/{}:{}:{}.json",
            self.base_url, imdb_id, season, episode
        );
        self.fetch_streams(&url).await
    }

    /// Fetch, parse and normalize streams from a Torrentio URL.
    ///
    /// Indexer ranking is kept as-is.
    async fn fetch_streams(&self, url: &str) -> Result<Vec<StreamCandidate>, IndexerError> {
        tracing::debug!(%url, "querying torrentio");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexerError::QueryFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::QueryFailed(format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| IndexerError::QueryFailed(format!("failed to read body: {}", e)))?;

        let data: TorrentioResponse = serde_json::from_str(&text)
            .map_err(|e| IndexerError::QueryFailed(format!("failed to parse JSON: {}", e)))?;

        let total = data.streams.len();
        let streams: Vec<StreamCandidate> =
            data.streams.iter().filter_map(RawStream::normalize).collect();

        if streams.len() < total {
            tracing::debug!(
                dropped = total - streams.len(),
                "dropped torrentio records without locator"
            );
        }

        Ok(streams)
    }
}

impl Default for TorrentioClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamIndexer for TorrentioClient {
    async fn streams(
        &self,
        imdb_id: &str,
        episode: Option<EpisodeRef>,
    ) -> Result<Vec<StreamCandidate>, IndexerError> {
        match episode {
            Some(ep) => self.episode_streams(imdb_id, ep.season, ep.episode).await,
            None => self.movie_streams(imdb_id).await,
        }
    }
}
