//! Configuration management for kino
//!
//! Handles config file loading/saving and the Real-Debrid API key.
//! Config is stored at ~/.config/kino/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DebridCredential;
use crate::resolve::ResolverSettings;

/// Environment variable holding the Real-Debrid API key
pub const DEBRID_KEY_ENV: &str = "REAL_DEBRID_API_KEY";

/// Upper bound for `poll_timeout_secs`
pub const MAX_POLL_TIMEOUT_SECS: u64 = 3600;

const DEFAULT_TORRENTIO_URL: &str = "https://torrentio.strem.fun";
const DEFAULT_DEBRID_URL: &str = "https://api.real-debrid.com/rest/1.0";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Real-Debrid API key (REAL_DEBRID_API_KEY wins over this)
    pub debrid_api_key: Option<String>,
    /// Torrentio addon base URL
    pub torrentio_url: String,
    /// Real-Debrid REST base URL
    pub debrid_url: String,
    /// Per-request and per-stage timeout
    pub request_timeout_secs: u64,
    /// Delay between Real-Debrid info polls
    pub poll_interval_secs: u64,
    /// How long to wait for Real-Debrid to expose links
    pub poll_timeout_secs: u64,
    /// Watchlist location (defaults to the data dir)
    pub watchlist_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debrid_api_key: None,
            torrentio_url: DEFAULT_TORRENTIO_URL.to_string(),
            debrid_url: DEFAULT_DEBRID_URL.to_string(),
            request_timeout_secs: 15,
            poll_interval_secs: 2,
            poll_timeout_secs: 30,
            watchlist_path: None,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/kino/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kino").join("config.toml"))
    }

    /// Load config from the default location, or defaults if missing
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Real-Debrid credential with fallback chain:
    /// 1. Environment variable REAL_DEBRID_API_KEY
    /// 2. Key from config file
    pub fn debrid_credential(&self) -> Option<DebridCredential> {
        std::env::var(DEBRID_KEY_ENV)
            .ok()
            .and_then(DebridCredential::new)
            .or_else(|| self.debrid_api_key.clone().and_then(DebridCredential::new))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            stage_timeout: self.request_timeout(),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs.min(MAX_POLL_TIMEOUT_SECS)),
        }
    }

    /// Watchlist file, defaulting to ~/.local/share/kino/watchlist.json
    pub fn watchlist_path(&self) -> PathBuf {
        self.watchlist_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("kino")
                .join("watchlist.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.debrid_api_key.is_none());
        assert_eq!(config.torrentio_url, "https://torrentio.strem.fun");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            debrid_api_key = "abc"
            poll_timeout_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.debrid_api_key.as_deref(), Some("abc"));
        assert_eq!(config.poll_timeout_secs, 60);
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.debrid_url, "https://api.real-debrid.com/rest/1.0");
    }

    #[test]
    fn test_resolver_settings_from_config() {
        let config = Config {
            request_timeout_secs: 10,
            poll_interval_secs: 3,
            poll_timeout_secs: 0,
            ..Config::default()
        };
        let s = config.resolver_settings();
        assert_eq!(s.stage_timeout, Duration::from_secs(10));
        assert_eq!(s.poll_interval, Duration::from_secs(3));
        assert_eq!(s.poll_timeout, Duration::ZERO);
    }

    #[test]
    fn test_poll_settings_are_clamped() {
        let config: Config = toml::from_str(
            r#"
            poll_interval_secs = 0
            poll_timeout_secs = 9223372036854775807
            "#,
        )
        .unwrap();
        let s = config.resolver_settings();
        assert_eq!(s.poll_interval, Duration::from_secs(1));
        assert_eq!(s.poll_timeout, Duration::from_secs(MAX_POLL_TIMEOUT_SECS));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            debrid_api_key: Some("key".into()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.debrid_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_blank_config_key_is_missing() {
        let config = Config {
            debrid_api_key: Some("  ".into()),
            ..Config::default()
        };
        if std::env::var(DEBRID_KEY_ENV).is_err() {
            assert!(config.debrid_credential().is_none());
        }
    }
}
