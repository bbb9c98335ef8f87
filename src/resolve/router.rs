//! Playback mode decision

use crate::models::{OriginKind, PlaybackInstruction};

/// Decide how a candidate gets played.
///
/// `resolved` is the direct URL produced by the resolver, if it ran.
/// Resolver errors never reach this function.
pub fn route(locator: &str, origin: OriginKind, resolved: Option<&str>) -> PlaybackInstruction {
    match (origin, resolved) {
        (OriginKind::EmbedServer, _) => PlaybackInstruction::Embed(locator.to_string()),
        (OriginKind::TorrentMagnet, Some(url)) => {
            PlaybackInstruction::DirectStream(url.to_string())
        }
        (OriginKind::TorrentMagnet, None) => {
            PlaybackInstruction::UnsupportedMagnet(locator.to_string())
        }
    }
}
