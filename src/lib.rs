//! kino - turn a movie into a playable stream
//!
//! Aggregates embed servers and Torrentio releases for a title, and resolves
//! torrent magnets into direct HTTP URLs through Real-Debrid.
//!
//! # Modules
//!
//! - `models` - Candidates, resolution jobs, playback instructions
//! - `api` - API clients (Torrentio, Real-Debrid)
//! - `resolve` - Aggregator, resolver, router and orchestrator
//! - `watchlist` - Local saved titles
//! - `config` - Config file and credentials

pub mod api;
pub mod config;
pub mod models;
pub mod resolve;
pub mod watchlist;

// Re-export commonly used types
pub use models::{
    Aggregation, JobStage, MediaType, OriginKind, PlaybackInstruction, QualityTier,
    ResolutionJob, StreamCandidate, TitleRef, TorrentListing,
};

pub use api::{RealDebridClient, TorrentioClient};
pub use resolve::{ResolutionOrchestrator, ResolveError};
