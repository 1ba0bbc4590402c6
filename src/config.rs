//! Configuration management for ChatSync
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatSyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for ChatSync
///
/// Holds the remote service endpoint settings, the local cache location,
/// and the boilerplate exclusion filter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote conversation service settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Message exclusion settings
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Remote conversation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the conversation service
    ///
    /// Tests point this at a mock server; production deployments point it at
    /// the real backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for directory, log, and delete requests (seconds)
    ///
    /// The streaming chat request is exempt from this timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory override; the platform data directory is used when
    /// unset (see `CacheStore::open_default`)
    #[serde(default)]
    pub path: Option<String>,
}

/// Message exclusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Boilerplate greeting signatures
    ///
    /// A message is excluded when its content contains every phrase of any
    /// one set. The default carries the greeting blurb known from legacy
    /// backend system prompts.
    #[serde(default = "crate::filter::default_signatures")]
    pub boilerplate_signatures: Vec<Vec<String>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            boilerplate_signatures: crate::filter::default_signatures(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, applying CLI overrides
    ///
    /// A missing file is not an error: defaults are used, so the binary runs
    /// without any configuration present.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command line arguments whose overrides take
    ///   precedence over file values
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ChatSyncError::Config(format!("Failed to read {}: {}", path, e)))?;
            serde_yaml::from_str(&contents)
                .map_err(|e| ChatSyncError::Config(format!("Failed to parse {}: {}", path, e)))?
        } else {
            tracing::debug!("no configuration file at {}, using defaults", path);
            Self::default()
        };

        if let Some(base_url) = &cli.base_url {
            config.remote.base_url = base_url.clone();
        }
        if let Some(cache_dir) = &cli.cache_dir {
            config.cache.path = Some(cache_dir.clone());
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ChatSyncError::Config` when the base URL does not parse or
    /// the request timeout is zero.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.remote.base_url).map_err(|e| {
            ChatSyncError::Config(format!(
                "remote.base_url {} is not a valid URL: {}",
                self.remote.base_url, e
            ))
        })?;

        if self.remote.request_timeout_seconds == 0 {
            return Err(ChatSyncError::Config(
                "remote.request_timeout_seconds must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    fn cli_with(base_url: Option<&str>, cache_dir: Option<&str>) -> Cli {
        Cli {
            config: Some("config/config.yaml".to_string()),
            base_url: base_url.map(|s| s.to_string()),
            cache_dir: cache_dir.map(|s| s.to_string()),
            command: Commands::Chat { conversation: None },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.remote.base_url, "http://localhost:8080");
        assert_eq!(config.remote.request_timeout_seconds, 30);
        assert!(config.cache.path.is_none());
        assert_eq!(config.filter.boilerplate_signatures.len(), 1);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/config.yaml", &cli_with(None, None)).unwrap();
        assert_eq!(config.remote.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_load_parses_yaml() {
        let yaml = r#"
remote:
  base_url: "http://chat.example.com"
  request_timeout_seconds: 10
cache:
  path: "/var/lib/chatsync"
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();

        let config =
            Config::load(path.to_str().unwrap(), &cli_with(None, None)).expect("load failed");
        assert_eq!(config.remote.base_url, "http://chat.example.com");
        assert_eq!(config.remote.request_timeout_seconds, 10);
        assert_eq!(config.cache.path.as_deref(), Some("/var/lib/chatsync"));
        // Unspecified sections fall back to defaults
        assert_eq!(config.filter.boilerplate_signatures.len(), 1);
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "remote: [not, a, mapping]").unwrap();

        assert!(Config::load(path.to_str().unwrap(), &cli_with(None, None)).is_err());
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let config = Config::load(
            "/nonexistent/config.yaml",
            &cli_with(Some("http://override:9999"), Some("/tmp/cache")),
        )
        .unwrap();
        assert_eq!(config.remote.base_url, "http://override:9999");
        assert_eq!(config.cache.path.as_deref(), Some("/tmp/cache"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.remote.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.remote.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
