//! Stream resolution engine
//!
//! - Aggregator: embed servers + Torrentio candidates for a title
//! - Resolver: Real-Debrid magnet to direct URL workflow
//! - Router: picks the playback mode for a candidate
//! - Orchestrator: entry point for the presentation layer

pub mod aggregator;
pub mod orchestrator;
pub mod resolver;
pub mod router;

use thiserror::Error;

pub use aggregator::StreamAggregator;
pub use orchestrator::ResolutionOrchestrator;
pub use resolver::{DebridResolver, ResolverSettings};

/// Why a stream could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Real-Debrid IP blocked or bad token")]
    AuthRejected,

    #[error("Real-Debrid premium account required. Please upgrade your account.")]
    PremiumRequired,

    #[error("Real-Debrid: {0}")]
    Provider(String),

    #[error("No links found in torrent (Real-Debrid may still be caching it)")]
    NoLinksAvailable,

    #[error("Failed to unrestrict link")]
    UnrestrictFailed,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to resolve stream: {0}")]
    Unknown(String),

    #[error("Superseded by a newer request")]
    Superseded,
}

impl ResolveError {
    /// Missing credential error
    pub fn missing_credential() -> Self {
        ResolveError::Config(
            "Real-Debrid API key not configured (set REAL_DEBRID_API_KEY)".to_string(),
        )
    }

    /// True for errors that only mean "a newer request won"
    pub fn is_superseded(&self) -> bool {
        matches!(self, ResolveError::Superseded)
    }
}
