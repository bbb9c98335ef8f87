//! Resolution orchestrator
//!
//! What the presentation layer calls. Only the latest aggregation and the
//! latest resolution are ever delivered: older ones come back as
//! [`ResolveError::Superseded`] and never reach the router.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::api::{RealDebridClient, TorrentioClient};
use crate::config::Config;
use crate::models::{
    Aggregation, OriginKind, PlaybackInstruction, ResolutionJob, StreamCandidate, TitleRef,
};
use crate::resolve::{router, DebridResolver, ResolveError, StreamAggregator};

pub struct ResolutionOrchestrator {
    aggregator: StreamAggregator,
    /// `None` when no debrid credential is configured
    resolver: Option<DebridResolver>,
    /// Token of the resolution in flight, tagged with its sequence number
    active: Mutex<Option<(u64, CancellationToken)>>,
    resolution_seq: AtomicU64,
    aggregation_generation: AtomicU64,
}

impl ResolutionOrchestrator {
    pub fn new(aggregator: StreamAggregator, resolver: Option<DebridResolver>) -> Self {
        Self {
            aggregator,
            resolver,
            active: Mutex::new(None),
            resolution_seq: AtomicU64::new(0),
            aggregation_generation: AtomicU64::new(0),
        }
    }

    /// Wire up Torrentio and Real-Debrid from configuration
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.request_timeout();
        let indexer = TorrentioClient::with_timeout(config.torrentio_url.clone(), timeout);
        let resolver = config.debrid_credential().map(|credential| {
            let api =
                RealDebridClient::with_timeout(credential, config.debrid_url.clone(), timeout);
            DebridResolver::with_settings(Arc::new(api), config.resolver_settings())
        });
        if resolver.is_none() {
            tracing::debug!("no Real-Debrid key, torrent resolution disabled");
        }

        Self::new(StreamAggregator::new(Arc::new(indexer)), resolver)
    }

    pub fn can_resolve(&self) -> bool {
        self.resolver.is_some()
    }

    /// Aggregate candidates for a title.
    ///
    /// Fails only with `Superseded`, when another aggregation started
    /// before this one finished.
    pub async fn aggregate(&self, title: &TitleRef) -> Result<Aggregation, ResolveError> {
        let generation = self.aggregation_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let aggregation = self.aggregator.aggregate(title).await;

        if self.aggregation_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(%title, "dropping stale aggregation");
            return Err(ResolveError::Superseded);
        }
        Ok(aggregation)
    }

    /// Turn the user's pick into a playback instruction.
    ///
    /// Torrent candidates go through Real-Debrid first; a newer call
    /// cancels any resolution still in flight.
    pub async fn select_candidate(
        &self,
        candidate: &StreamCandidate,
    ) -> Result<PlaybackInstruction, ResolveError> {
        match candidate.origin_kind {
            OriginKind::EmbedServer => Ok(router::route(
                &candidate.locator,
                OriginKind::EmbedServer,
                None,
            )),
            OriginKind::TorrentMagnet => {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(ResolveError::missing_credential)?;

                let (id, token) = self.supersede();
                let job = resolver.resolve(candidate.clone(), &token).await;
                self.deliver(id, candidate, job)
            }
        }
    }

    /// Route a finished job unless a newer resolution replaced it meanwhile
    fn deliver(
        &self,
        id: u64,
        candidate: &StreamCandidate,
        job: ResolutionJob,
    ) -> Result<PlaybackInstruction, ResolveError> {
        if !self.release(id) {
            tracing::debug!(job = %job.id, "discarding superseded result");
            return Err(ResolveError::Superseded);
        }

        let url = job.outcome()?;
        Ok(router::route(
            &candidate.locator,
            OriginKind::TorrentMagnet,
            Some(&url),
        ))
    }

    /// Same as [`select_candidate`](Self::select_candidate)
    pub async fn resolve(
        &self,
        candidate: &StreamCandidate,
    ) -> Result<PlaybackInstruction, ResolveError> {
        self.select_candidate(candidate).await
    }

    /// Hand a torrent off to an external client without resolving it
    pub fn handoff(&self, candidate: &StreamCandidate) -> PlaybackInstruction {
        router::route(&candidate.locator, candidate.origin_kind, None)
    }

    /// Cancel whatever resolution is in flight (e.g. the player was closed)
    pub fn cancel(&self) {
        if let Some((_, token)) = self.lock_active().take() {
            token.cancel();
        }
    }

    /// Cancel the previous resolution and register a fresh token
    fn supersede(&self) -> (u64, CancellationToken) {
        let id = self.resolution_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.lock_active().replace((id, token.clone())) {
            tracing::debug!("superseding in-flight resolution");
            previous.cancel();
        }
        (id, token)
    }

    /// Clear the slot if it still holds `id`.
    ///
    /// Returns false when another resolution or `cancel` took it over.
    fn release(&self, id: u64) -> bool {
        let mut active = self.lock_active();
        if matches!(active.as_ref(), Some((current, _)) if *current == id) {
            *active = None;
            true
        } else {
            false
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> ResolutionOrchestrator {
        ResolutionOrchestrator::new(StreamAggregator::new(Arc::new(TorrentioClient::new())), None)
    }

    fn resolved_job(url: &str) -> ResolutionJob {
        let mut job = ResolutionJob::new(StreamCandidate::magnet("magnet:?xt=urn:btih:abc"));
        job.resolve(url.to_string());
        job
    }

    #[test]
    fn test_release_only_for_current_id() {
        let orch = orchestrator();
        let (first, _) = orch.supersede();
        let (second, _) = orch.supersede();

        assert!(!orch.release(first));
        assert!(orch.release(second));
        assert!(!orch.release(second));
    }

    #[test]
    fn test_resolved_job_superseded_before_delivery() {
        let orch = orchestrator();
        let candidate = StreamCandidate::magnet("magnet:?xt=urn:btih:abc");
        let (first, first_token) = orch.supersede();

        // First pipeline already finished; a newer pick lands before delivery
        let job = resolved_job("https://download.example/first.mkv");
        let (second, _) = orch.supersede();

        assert!(first_token.is_cancelled());
        assert_eq!(
            orch.deliver(first, &candidate, job),
            Err(ResolveError::Superseded)
        );
        assert_eq!(
            orch.deliver(second, &candidate, resolved_job("https://download.example/second.mkv")),
            Ok(PlaybackInstruction::DirectStream(
                "https://download.example/second.mkv".into()
            ))
        );
    }

    #[test]
    fn test_cancel_blocks_delivery() {
        let orch = orchestrator();
        let candidate = StreamCandidate::magnet("magnet:?xt=urn:btih:abc");
        let (id, token) = orch.supersede();

        orch.cancel();

        assert!(token.is_cancelled());
        assert_eq!(
            orch.deliver(id, &candidate, resolved_job("https://download.example/x.mkv")),
            Err(ResolveError::Superseded)
        );
    }
}
