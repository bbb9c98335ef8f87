//! Data structures and types for kino
//!
//! Shared models used across the resolution engine, organized by domain:
//! - **Titles**: what the user asked to watch
//! - **Candidates**: embed servers and Torrentio releases
//! - **Resolution**: Real-Debrid job tracking
//! - **Playback**: what the presentation layer should render

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::resolve::ResolveError;

// =============================================================================
// Title Models
// =============================================================================

/// Media type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Tv => write!(f, "TV Show"),
        }
    }
}

/// A title to find streams for.
///
/// `tmdb_id` drives the embed servers, `imdb_id` is the cross-reference
/// the indexer understands. Without it only embeds are offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRef {
    pub tmdb_id: String,
    pub imdb_id: Option<String>,
    pub episode: Option<EpisodeRef>,
}

/// Season/episode pair for series lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: u16,
    pub episode: u16,
}

impl TitleRef {
    pub fn movie(tmdb_id: impl Into<String>, imdb_id: Option<String>) -> Self {
        Self {
            tmdb_id: tmdb_id.into(),
            imdb_id,
            episode: None,
        }
    }

    pub fn episode(
        tmdb_id: impl Into<String>,
        imdb_id: Option<String>,
        season: u16,
        episode: u16,
    ) -> Self {
        Self {
            tmdb_id: tmdb_id.into(),
            imdb_id,
            episode: Some(EpisodeRef { season, episode }),
        }
    }
}

impl fmt::Display for TitleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmdb:{}", self.tmdb_id)?;
        if let Some(imdb) = &self.imdb_id {
            write!(f, " ({})", imdb)?;
        }
        if let Some(ep) = self.episode {
            write!(f, " S{:02}E{:02}", ep.season, ep.episode)?;
        }
        Ok(())
    }
}

// =============================================================================
// Candidate Models
// =============================================================================

/// Video quality tier shown next to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QualityTier {
    #[serde(rename = "4K")]
    UHD4K,
    #[serde(rename = "1080p")]
    FHD1080p,
    #[serde(rename = "720p")]
    HD720p,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl QualityTier {
    /// Classify a release label.
    ///
    /// "4k" (any case) wins over everything, then "1080". Anything else is
    /// reported as 720p; releases rarely omit the tag below that.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("4k") {
            QualityTier::UHD4K
        } else if lower.contains("1080") {
            QualityTier::FHD1080p
        } else {
            QualityTier::HD720p
        }
    }

    /// Quality ranking for filtering (higher = better)
    pub fn rank(&self) -> u8 {
        match self {
            QualityTier::UHD4K => 3,
            QualityTier::FHD1080p => 2,
            QualityTier::HD720p => 1,
            QualityTier::Unknown => 0,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::UHD4K => write!(f, "4K"),
            QualityTier::FHD1080p => write!(f, "1080p"),
            QualityTier::HD720p => write!(f, "720p"),
            QualityTier::Unknown => write!(f, "???"),
        }
    }
}

/// Where a candidate came from, which decides how it gets played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginKind {
    /// Pre-built iframe URL, playable as-is
    EmbedServer,
    /// Torrent release that has to go through Real-Debrid first
    TorrentMagnet,
}

/// One playable option surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub source: String,
    pub label: String,
    pub quality_tier: QualityTier,
    pub size_label: String,
    pub locator: String,
    pub origin_kind: OriginKind,
    #[serde(default)]
    pub recommended: bool,
}

impl StreamCandidate {
    /// Build an embed server candidate
    pub fn embed(name: impl Into<String>, url: impl Into<String>, recommended: bool) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            label: name,
            quality_tier: QualityTier::Unknown,
            size_label: String::new(),
            locator: url.into(),
            origin_kind: OriginKind::EmbedServer,
            recommended,
        }
    }

    /// Wrap a raw magnet link handed in by the user
    pub fn magnet(locator: impl Into<String>) -> Self {
        Self {
            source: "magnet".to_string(),
            label: "Magnet link".to_string(),
            quality_tier: QualityTier::Unknown,
            size_label: String::new(),
            locator: locator.into(),
            origin_kind: OriginKind::TorrentMagnet,
            recommended: false,
        }
    }

    pub fn is_torrent(&self) -> bool {
        self.origin_kind == OriginKind::TorrentMagnet
    }
}

impl fmt::Display for StreamCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.quality_tier, self.label)?;
        if !self.size_label.is_empty() {
            write!(f, " {}", self.size_label)?;
        }
        write!(f, " • {}", self.source)?;
        if self.recommended {
            write!(f, " (BEST)")?;
        }
        Ok(())
    }
}

/// State of the torrent part of an aggregation.
///
/// Distinguishes "still loading", "loaded, maybe empty" and "query failed"
/// so the presentation layer can render each differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum TorrentListing {
    #[default]
    Loading,
    Loaded(Vec<StreamCandidate>),
    Failed(String),
    /// No IMDB id for the title, the indexer was never asked
    Unavailable,
}

impl TorrentListing {
    pub fn is_loading(&self) -> bool {
        matches!(self, TorrentListing::Loading)
    }

    pub fn candidates(&self) -> &[StreamCandidate] {
        match self {
            TorrentListing::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TorrentListing::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Result of aggregating streams for a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub embeds: Vec<StreamCandidate>,
    pub torrents: TorrentListing,
}

impl Aggregation {
    /// All candidates, embeds first, torrents in indexer order
    pub fn candidates(&self) -> Vec<StreamCandidate> {
        self.embeds
            .iter()
            .chain(self.torrents.candidates())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.embeds.len() + self.torrents.candidates().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Resolution Models
// =============================================================================

/// Position of a Real-Debrid job in the resolution workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Submitted,
    FilesSelected,
    InfoFetched,
    Resolved,
    Failed,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Resolved | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Submitted => write!(f, "submitted"),
            JobStage::FilesSelected => write!(f, "files selected"),
            JobStage::InfoFetched => write!(f, "info fetched"),
            JobStage::Resolved => write!(f, "resolved"),
            JobStage::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of the "select files" stage.
///
/// A failed selection does not stop the job; the provider may already have
/// files staged from an earlier request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSelection {
    Staged,
    Skipped(String),
}

/// One attempt to turn a torrent candidate into a direct URL
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionJob {
    pub id: Uuid,
    pub candidate: StreamCandidate,
    pub stage: JobStage,
    pub started_at: DateTime<Utc>,
    /// Real-Debrid torrent id once the magnet was accepted
    pub provider_id: Option<String>,
    pub file_selection: Option<FileSelection>,
    pub result: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ResolveError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<ResolveError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl ResolutionJob {
    /// Create a new job in Submitted stage
    pub fn new(candidate: StreamCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            stage: JobStage::Submitted,
            started_at: Utc::now(),
            provider_id: None,
            file_selection: None,
            result: None,
            error: None,
        }
    }

    pub(crate) fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
    }

    pub(crate) fn resolve(&mut self, url: String) {
        self.stage = JobStage::Resolved;
        self.result = Some(url);
    }

    pub(crate) fn fail(&mut self, error: ResolveError) {
        self.stage = JobStage::Failed;
        self.error = Some(error);
    }

    /// Consume the job into its terminal outcome
    pub fn outcome(self) -> Result<String, ResolveError> {
        match (self.result, self.error) {
            (Some(url), None) => Ok(url),
            (_, Some(err)) => Err(err),
            (None, None) => Err(ResolveError::Unknown(format!(
                "job {} stopped in stage '{}'",
                self.id, self.stage
            ))),
        }
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// What the presentation layer should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "url", rename_all = "snake_case")]
pub enum PlaybackInstruction {
    /// Iframe player pointed at an embed server
    Embed(String),
    /// Native video element with a direct HTTP URL
    DirectStream(String),
    /// Show the raw magnet for an external torrent client
    UnsupportedMagnet(String),
}

impl PlaybackInstruction {
    pub fn url(&self) -> &str {
        match self {
            PlaybackInstruction::Embed(url)
            | PlaybackInstruction::DirectStream(url)
            | PlaybackInstruction::UnsupportedMagnet(url) => url,
        }
    }
}

impl fmt::Display for PlaybackInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackInstruction::Embed(url) => write!(f, "embed: {}", url),
            PlaybackInstruction::DirectStream(url) => write!(f, "direct: {}", url),
            PlaybackInstruction::UnsupportedMagnet(url) => {
                write!(f, "open in torrent client: {}", url)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_classify() {
        assert_eq!(QualityTier::classify("Movie.2160p.4K.HDR"), QualityTier::UHD4K);
        assert_eq!(QualityTier::classify("movie 4k remux"), QualityTier::UHD4K);
        assert_eq!(QualityTier::classify("Movie.1080p.BluRay"), QualityTier::FHD1080p);
        assert_eq!(QualityTier::classify("Movie.720p.WEB"), QualityTier::HD720p);
        assert_eq!(QualityTier::classify("Movie.DVDRip"), QualityTier::HD720p);
        assert_eq!(QualityTier::classify(""), QualityTier::HD720p);
    }

    #[test]
    fn test_quality_serde_names() {
        assert_eq!(serde_json::to_string(&QualityTier::UHD4K).unwrap(), r#""4K""#);
        assert_eq!(
            serde_json::to_string(&QualityTier::Unknown).unwrap(),
            r#""unknown""#
        );
    }

    #[test]
    fn test_embed_candidate() {
        let c = StreamCandidate::embed(
            "Server 1 (VidSrc)",
            "https://vidsrc.xyz/embed/movie/1",
            true,
        );
        assert_eq!(c.origin_kind, OriginKind::EmbedServer);
        assert_eq!(c.quality_tier, QualityTier::Unknown);
        assert!(c.size_label.is_empty());
        assert!(!c.is_torrent());
        assert!(c.to_string().contains("BEST"));
    }

    #[test]
    fn test_torrent_listing_states() {
        assert!(TorrentListing::default().is_loading());
        assert!(TorrentListing::Loaded(vec![]).candidates().is_empty());
        assert_eq!(TorrentListing::Failed("boom".into()).error(), Some("boom"));
        assert!(TorrentListing::Unavailable.error().is_none());
    }

    #[test]
    fn test_job_lifecycle() {
        let candidate = StreamCandidate::embed("x", "y", false);
        let mut job = ResolutionJob::new(candidate);
        assert_eq!(job.stage, JobStage::Submitted);
        assert!(!job.stage.is_terminal());

        job.advance(JobStage::FilesSelected);
        job.resolve("https://download.example/file.mkv".into());
        assert!(job.stage.is_terminal());
        assert_eq!(job.outcome().unwrap(), "https://download.example/file.mkv");
    }

    #[test]
    fn test_job_failure_outcome() {
        let mut job = ResolutionJob::new(StreamCandidate::embed("x", "y", false));
        job.fail(ResolveError::NoLinksAvailable);
        assert_eq!(job.stage, JobStage::Failed);
        assert_eq!(job.outcome(), Err(ResolveError::NoLinksAvailable));
    }

    #[test]
    fn test_title_display() {
        let t = TitleRef::episode("1396", Some("tt0903747".into()), 1, 3);
        assert_eq!(t.to_string(), "tmdb:1396 (tt0903747) S01E03");
    }

    #[test]
    fn test_playback_instruction_url() {
        let p = PlaybackInstruction::DirectStream("https://x/y.mp4".into());
        assert_eq!(p.url(), "https://x/y.mp4");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"mode":"direct_stream","url":"https://x/y.mp4"}"#);
    }
}
