//! Stream aggregation
//!
//! Embed servers are built locally from the TMDB id and always come first.
//! Torrent candidates come from one indexer query and keep its ranking.

use std::sync::Arc;

use crate::api::StreamIndexer;
use crate::models::{Aggregation, StreamCandidate, TitleRef, TorrentListing};

/// Build the fixed embed server list for a title.
///
/// Always three entries; the first one is the recommended default.
pub fn embed_servers(title: &TitleRef) -> Vec<StreamCandidate> {
    let id = &title.tmdb_id;
    match title.episode {
        None => vec![
            StreamCandidate::embed(
                "Server 1 (VidSrc)",
                format!("https://vidsrc.xyz/embed/movie/{}", id),
                true,
            ),
            StreamCandidate::embed(
                "Server 2 (SuperEmbed)",
                format!("https://multiembed.mov/?video_id={}&tmdb=1", id),
                false,
            ),
            StreamCandidate::embed(
                "Server 3 (2Embed)",
                format!("https://www.2embed.cc/embed/{}", id),
                false,
            ),
        ],
        Some(ep) => vec![
            StreamCandidate::embed(
                "Server 1 (VidSrc)",
                format!(
                    "https://vidsrc.xyz/embed/tv/{}/{}-{}",
                    id, ep.season, ep.episode
                ),
                true,
            ),
            StreamCandidate::embed(
                "Server 2 (SuperEmbed)",
                format!(
                    "https://multiembed.mov/?video_id={}&tmdb=1&s={}&e={}",
                    id, ep.season, ep.episode
                ),
                false,
            ),
            StreamCandidate::embed(
                "Server 3 (2Embed)",
                format!(
                    "https://www.2embed.cc/embedtv/{}&s={}&e={}",
                    id, ep.season, ep.episode
                ),
                false,
            ),
        ],
    }
}

/// Collects every candidate for a title
pub struct StreamAggregator {
    indexer: Arc<dyn StreamIndexer>,
}

impl StreamAggregator {
    pub fn new(indexer: Arc<dyn StreamIndexer>) -> Self {
        Self { indexer }
    }

    /// Aggregate candidates for a title.
    ///
    /// Indexer failures never escape: they end up as
    /// [`TorrentListing::Failed`] and the embeds stay usable.
    pub async fn aggregate(&self, title: &TitleRef) -> Aggregation {
        let embeds = embed_servers(title);

        let torrents = match title.imdb_id.as_deref().filter(|id| !id.is_empty()) {
            None => {
                tracing::debug!(%title, "no imdb id, skipping indexer");
                TorrentListing::Unavailable
            }
            Some(imdb_id) => match self.indexer.streams(imdb_id, title.episode).await {
                Ok(found) => {
                    tracing::info!(%title, count = found.len(), "torrent streams loaded");
                    TorrentListing::Loaded(found)
                }
                Err(e) => {
                    tracing::warn!(%title, error = %e, "indexer query failed");
                    TorrentListing::Failed(e.to_string())
                }
            },
        };

        Aggregation { embeds, torrents }
    }
}
