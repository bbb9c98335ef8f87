//! Real-Debrid REST client
//!
//! Thin binding over the four endpoints the resolver drives:
//! `torrents/addMagnet`, `torrents/selectFiles/{id}`, `torrents/info/{id}`
//! and `unrestrict/link`. API docs: https://api.real-debrid.com/
//!
//! Provider failures are classified here into [`ResolveError`] so the
//! resolver only deals with workflow.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::resolve::ResolveError;

/// Real-Debrid error code: action requires a premium account
pub const ERROR_CODE_PREMIUM_REQUIRED: i64 = 9;
/// Real-Debrid error code: bad token or IP blocked
pub const ERROR_CODE_AUTH_REJECTED: i64 = 8;

/// Provider statuses that mean the torrent will never produce links
const DEAD_STATUSES: &[&str] = &["error", "dead", "magnet_error", "virus"];

// =============================================================================
// Credential
// =============================================================================

/// Bearer token for the debrid service.
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct DebridCredential(String);

impl DebridCredential {
    /// Wrap a token; blank tokens count as missing
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for DebridCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DebridCredential(***)")
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

/// Job metadata from `torrents/info/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TorrentInfo {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub links: Vec<String>,
}

impl TorrentInfo {
    /// True when the provider gave up on this torrent
    pub fn is_dead(&self) -> bool {
        DEAD_STATUSES.contains(&self.status.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Classify a non-2xx Real-Debrid response body
pub fn classify_provider_error(status: StatusCode, body: &str) -> ResolveError {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(err) => match err.error_code {
            Some(ERROR_CODE_PREMIUM_REQUIRED) => ResolveError::PremiumRequired,
            Some(ERROR_CODE_AUTH_REJECTED) => ResolveError::AuthRejected,
            _ => ResolveError::Provider(err.error.unwrap_or_else(|| body.to_string())),
        },
        Err(_) if body.trim().is_empty() => ResolveError::Provider(format!("HTTP {}", status)),
        Err(_) => ResolveError::Provider(body.to_string()),
    }
}

/// Map a transport-level failure
fn transport_error(err: reqwest::Error) -> ResolveError {
    if err.is_decode() {
        ResolveError::Unknown(err.to_string())
    } else {
        ResolveError::Network(err.to_string())
    }
}

// =============================================================================
// Provider trait
// =============================================================================

/// The four debrid operations the resolver needs
#[async_trait]
pub trait DebridApi: Send + Sync {
    /// Submit a magnet; returns the provider's torrent id
    async fn add_magnet(&self, magnet: &str) -> Result<String, ResolveError>;

    /// Stage every file of the torrent for download
    async fn select_files(&self, torrent_id: &str) -> Result<(), ResolveError>;

    /// Fetch job metadata including downloadable links
    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, ResolveError>;

    /// Turn a hoster link into a direct download URL
    async fn unrestrict_link(&self, link: &str) -> Result<String, ResolveError>;
}

// =============================================================================
// Real-Debrid client
// =============================================================================

/// Real-Debrid API client
pub struct RealDebridClient {
    credential: DebridCredential,
    base_url: String,
    client: reqwest::Client,
}

impl RealDebridClient {
    /// Create a new client against the public API
    pub fn new(credential: DebridCredential) -> Self {
        Self::with_base_url(credential, "https://api.real-debrid.com/rest/1.0")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(credential: DebridCredential, base_url: impl Into<String>) -> Self {
        Self::with_timeout(credential, base_url, Duration::from_secs(15))
    }

    pub fn with_timeout(
        credential: DebridCredential,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            credential,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Read the body of a failed response and classify it
    async fn provider_error(response: reqwest::Response) -> ResolveError {
        let status = response.status();
        match response.text().await {
            Ok(body) => classify_provider_error(status, &body),
            Err(e) => transport_error(e),
        }
    }
}

#[async_trait]
impl DebridApi for RealDebridClient {
    async fn add_magnet(&self, magnet: &str) -> Result<String, ResolveError> {
        let response = self
            .client
            .post(self.url("/torrents/addMagnet"))
            .header("Authorization", self.credential.bearer())
            .form(&[("magnet", magnet)])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let data: AddMagnetResponse = response.json().await.map_err(transport_error)?;
        Ok(data.id)
    }

    async fn select_files(&self, torrent_id: &str) -> Result<(), ResolveError> {
        let response = self
            .client
            .post(self.url(&format!("/torrents/selectFiles/{}", torrent_id)))
            .header("Authorization", self.credential.bearer())
            .form(&[("files", "all")])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }
        Ok(())
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, ResolveError> {
        let response = self
            .client
            .get(self.url(&format!("/torrents/info/{}", torrent_id)))
            .header("Authorization", self.credential.bearer())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    async fn unrestrict_link(&self, link: &str) -> Result<String, ResolveError> {
        let response = self
            .client
            .post(self.url("/unrestrict/link"))
            .header("Authorization", self.credential.bearer())
            .form(&[("link", link)])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "unrestrict rejected");
            return Err(ResolveError::UnrestrictFailed);
        }

        let data: UnrestrictResponse = response.json().await.map_err(transport_error)?;
        Ok(data.download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank() {
        assert!(DebridCredential::new("").is_none());
        assert!(DebridCredential::new("   ").is_none());
        assert!(DebridCredential::new("abc").is_some());
    }

    #[test]
    fn test_credential_debug_redacted() {
        let cred = DebridCredential::new("super-secret").unwrap();
        let shown = format!("{:?}", cred);
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn test_classify_error_codes() {
        let s = StatusCode::FORBIDDEN;
        assert_eq!(
            classify_provider_error(s, r#"{"error":"permission_denied","error_code":9}"#),
            ResolveError::PremiumRequired
        );
        assert_eq!(
            classify_provider_error(s, r#"{"error":"bad_token","error_code":8}"#),
            ResolveError::AuthRejected
        );
        assert_eq!(
            classify_provider_error(s, r#"{"error":"infringing_file","error_code":35}"#),
            ResolveError::Provider("infringing_file".into())
        );
    }

    #[test]
    fn test_classify_unparseable_body() {
        assert_eq!(
            classify_provider_error(StatusCode::BAD_GATEWAY, "<html>502</html>"),
            ResolveError::Provider("<html>502</html>".into())
        );
        assert_eq!(
            classify_provider_error(StatusCode::BAD_GATEWAY, ""),
            ResolveError::Provider("HTTP 502 Bad Gateway".into())
        );
    }

    #[test]
    fn test_dead_statuses() {
        let info = TorrentInfo {
            status: "magnet_error".into(),
            links: vec![],
        };
        assert!(info.is_dead());
        assert!(!TorrentInfo::default().is_dead());
    }
}
