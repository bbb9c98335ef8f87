//! API clients for external services
//!
//! - Torrentio: Stream sources via Stremio addon protocol
//! - Real-Debrid: Magnet to direct URL resolution

pub mod debrid;
pub mod torrentio;

pub use debrid::{DebridApi, DebridCredential, RealDebridClient, TorrentInfo};
pub use torrentio::{IndexerError, StreamIndexer, TorrentioClient};
