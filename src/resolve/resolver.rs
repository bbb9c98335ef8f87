//! Real-Debrid resolution workflow
//!
//! Drives one magnet through submit → select files → info → unrestrict.
//! Every call is bounded by a stage timeout, the info stage polls until the
//! provider has links, and the cancellation token is honored between (and
//! during) stages. Nothing is retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::DebridApi;
use crate::models::{FileSelection, JobStage, ResolutionJob, StreamCandidate};
use crate::resolve::ResolveError;

/// Timing knobs for the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Upper bound for any single provider call
    pub stage_timeout: Duration,
    /// Delay between info polls while the provider is caching
    pub poll_interval: Duration,
    /// Total time to wait for links; zero means a single info call
    pub poll_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(30),
        }
    }
}

/// Pick the link to unrestrict when the provider returns several
pub fn select_first_link(links: &[String]) -> Option<&str> {
    links.first().map(String::as_str)
}

/// Turns magnet candidates into direct URLs
pub struct DebridResolver {
    api: Arc<dyn DebridApi>,
    settings: ResolverSettings,
}

impl DebridResolver {
    pub fn new(api: Arc<dyn DebridApi>) -> Self {
        Self::with_settings(api, ResolverSettings::default())
    }

    pub fn with_settings(api: Arc<dyn DebridApi>, settings: ResolverSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Run the whole workflow for a candidate.
    ///
    /// The returned job is always terminal: `Resolved` with the unrestricted
    /// URL or `Failed` with a classified error.
    pub async fn resolve(
        &self,
        candidate: StreamCandidate,
        cancel: &CancellationToken,
    ) -> ResolutionJob {
        let mut job = ResolutionJob::new(candidate);
        tracing::info!(job = %job.id, source = %job.candidate.source, "resolution started");

        match self.run(&mut job, cancel).await {
            Ok(url) => {
                tracing::info!(job = %job.id, "resolution succeeded");
                job.resolve(url);
            }
            Err(ResolveError::Superseded) => {
                tracing::debug!(job = %job.id, stage = %job.stage, "resolution superseded");
                job.fail(ResolveError::Superseded);
            }
            Err(e) => {
                tracing::warn!(job = %job.id, stage = %job.stage, error = %e, "resolution failed");
                job.fail(e);
            }
        }
        job
    }

    async fn run(
        &self,
        job: &mut ResolutionJob,
        cancel: &CancellationToken,
    ) -> Result<String, ResolveError> {
        let magnet = job.candidate.locator.clone();

        let torrent_id = self
            .stage("add magnet", cancel, self.api.add_magnet(&magnet))
            .await?;
        tracing::debug!(job = %job.id, torrent = %torrent_id, "magnet accepted");
        job.provider_id = Some(torrent_id.clone());

        let selection = match self
            .stage("select files", cancel, self.api.select_files(&torrent_id))
            .await
        {
            Ok(()) => FileSelection::Staged,
            Err(ResolveError::Superseded) => return Err(ResolveError::Superseded),
            Err(e) => {
                tracing::warn!(job = %job.id, error = %e, "file selection failed, continuing");
                FileSelection::Skipped(e.to_string())
            }
        };
        job.file_selection = Some(selection);
        job.advance(JobStage::FilesSelected);

        let links = self.wait_for_links(&torrent_id, cancel).await?;
        job.advance(JobStage::InfoFetched);

        let link = select_first_link(&links).ok_or(ResolveError::NoLinksAvailable)?;
        self.stage("unrestrict", cancel, self.api.unrestrict_link(link))
            .await
    }

    /// Poll job info until the provider exposes links or the budget runs out
    async fn wait_for_links(
        &self,
        torrent_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, ResolveError> {
        // `None` when the budget does not fit in an Instant: poll until links or cancel
        let deadline = Instant::now().checked_add(self.settings.poll_timeout);

        loop {
            let info = self
                .stage("fetch info", cancel, self.api.torrent_info(torrent_id))
                .await?;

            if info.is_dead() {
                return Err(ResolveError::Provider(format!(
                    "torrent failed with status '{}'",
                    info.status
                )));
            }
            if !info.links.is_empty() {
                return Ok(info.links);
            }
            if self.budget_spent(deadline) {
                return Err(ResolveError::NoLinksAvailable);
            }

            tracing::debug!(torrent = %torrent_id, status = %info.status, "links not ready");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolveError::Superseded),
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    /// True when another poll interval would overrun the deadline
    fn budget_spent(&self, deadline: Option<Instant>) -> bool {
        match deadline {
            None => false,
            Some(deadline) => Instant::now()
                .checked_add(self.settings.poll_interval)
                .map_or(true, |next| next > deadline),
        }
    }

    /// Run one provider call under the stage timeout and the cancel token
    async fn stage<T>(
        &self,
        name: &'static str,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, ResolveError>>,
    ) -> Result<T, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Superseded);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResolveError::Superseded),
            outcome = tokio::time::timeout(self.settings.stage_timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ResolveError::Network(format!(
                    "{} timed out after {}s",
                    name,
                    self.settings.stage_timeout.as_secs()
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_first_link() {
        let links = vec!["https://a".to_string(), "https://b".to_string()];
        assert_eq!(select_first_link(&links), Some("https://a"));
        assert_eq!(select_first_link(&[]), None);
    }

    #[test]
    fn test_default_settings() {
        let s = ResolverSettings::default();
        assert_eq!(s.stage_timeout, Duration::from_secs(15));
        assert_eq!(s.poll_interval, Duration::from_secs(2));
        assert_eq!(s.poll_timeout, Duration::from_secs(30));
    }
}
