//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! last used username, default provider, session timings, which credential
//! verifier to use and optional provider endpoint overrides.
//!
//! Configuration is stored at `~/.config/linkgate/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::session::{ACTIVITY_CHECK_INTERVAL_MS, SESSION_TIMEOUT_MS};
use crate::auth::{CredentialVerifier, KeyringVerifier, PlaceholderVerifier, SessionSettings};
use crate::shorten::client::REQUEST_TIMEOUT_SECS;
use crate::shorten::{ProviderId, ProviderRegistry};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "linkgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Which `CredentialVerifier` guards login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerifierKind {
    #[default]
    Placeholder,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub last_username: Option<String>,
    pub default_provider: ProviderId,
    pub session_timeout_secs: u64,
    pub activity_check_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub verifier: VerifierKind,
    pub tinyurl_endpoint: Option<String>,
    pub isgd_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_username: None,
            default_provider: ProviderId::default(),
            session_timeout_secs: (SESSION_TIMEOUT_MS / 1000) as u64,
            activity_check_interval_secs: (ACTIVITY_CHECK_INTERVAL_MS / 1000) as u64,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            verifier: VerifierKind::default(),
            tinyurl_endpoint: None,
            isgd_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session record and the log file
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn session_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();
        SessionSettings {
            timeout: secs_or(self.session_timeout_secs, defaults.timeout),
            check_interval: secs_or(self.activity_check_interval_secs, defaults.check_interval),
        }
    }

    pub fn request_timeout(&self) -> StdDuration {
        let secs = if self.request_timeout_secs == 0 {
            REQUEST_TIMEOUT_SECS
        } else {
            self.request_timeout_secs
        };
        StdDuration::from_secs(secs)
    }

    /// Default registry with any endpoint overrides that parse as URLs
    pub fn provider_registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::with_defaults();
        let overrides = [
            (ProviderId::TinyUrl, &self.tinyurl_endpoint),
            (ProviderId::IsGd, &self.isgd_endpoint),
        ];
        for (id, endpoint) in overrides {
            let Some(endpoint) = endpoint else { continue };
            if Url::parse(endpoint).is_ok() {
                registry.set_endpoint(id, endpoint.clone());
            } else {
                warn!(provider = id.as_str(), endpoint = %endpoint, "Ignoring invalid endpoint override");
            }
        }
        registry
    }

    pub fn credential_verifier(&self) -> Box<dyn CredentialVerifier> {
        match self.verifier {
            VerifierKind::Placeholder => Box::new(PlaceholderVerifier::default()),
            VerifierKind::Keyring => Box::new(KeyringVerifier),
        }
    }
}

fn secs_or(secs: u64, default: Duration) -> Duration {
    match i64::try_from(secs) {
        Ok(secs) if secs > 0 => Duration::try_seconds(secs).unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_constants() {
        let config = Config::default();
        assert_eq!(config.session_timeout_secs, 1800);
        assert_eq!(config.activity_check_interval_secs, 60);

        let settings = config.session_settings();
        assert_eq!(settings.timeout, Duration::milliseconds(1_800_000));
        assert_eq!(settings.check_interval, Duration::milliseconds(60_000));
        assert_eq!(config.request_timeout(), StdDuration::from_secs(30));
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let config = Config {
            session_timeout_secs: 0,
            activity_check_interval_secs: 0,
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.session_settings(), SessionSettings::default());
        assert_eq!(config.request_timeout(), StdDuration::from_secs(30));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "default_provider": "isgd", "verifier": "keyring" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_provider, ProviderId::IsGd);
        assert_eq!(config.verifier, VerifierKind::Keyring);
        assert_eq!(config.session_timeout_secs, 1800);
        assert_eq!(config.last_username, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            last_username: Some("admin".to_string()),
            default_provider: ProviderId::IsGd,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = Config {
            tinyurl_endpoint: Some("http://127.0.0.1:9000/create".to_string()),
            isgd_endpoint: Some("not a url".to_string()),
            ..Config::default()
        };
        let registry = config.provider_registry();

        assert_eq!(
            registry.get(ProviderId::TinyUrl).unwrap().endpoint,
            "http://127.0.0.1:9000/create"
        );
        assert_eq!(
            registry.get(ProviderId::IsGd).unwrap().endpoint,
            crate::shorten::provider::ISGD_ENDPOINT
        );
    }

    #[test]
    fn test_placeholder_verifier_selected_by_default() {
        let verifier = Config::default().credential_verifier();
        assert!(verifier.verify("admin", "1234"));
        assert!(!verifier.verify("admin", "4321"));
    }
}
