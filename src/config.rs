//! Configuration Management
//!
//! Handles persistent connection defaults for miq. Secrets (passwords,
//! tokens, client secrets) are never written to disk.

use anyhow::{Context, Result};
use clap::ValueEnum;
use manageiq::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// Authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    Basic,
    Bearer,
    Keycloak,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// ManageIQ API base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Authentication scheme
    #[serde(default)]
    pub auth: Option<AuthKind>,
    /// Username for basic and Keycloak authentication
    #[serde(default)]
    pub username: Option<String>,
    /// Keycloak server URL
    #[serde(default)]
    pub keycloak_url: Option<String>,
    /// Keycloak realm
    #[serde(default)]
    pub realm: Option<String>,
    /// Keycloak client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
}

impl Config {
    /// Directory holding the config file and the log
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("manageiq"))
    }

    /// Load `<config dir>/manageiq/config.json`, falling back to defaults
    pub fn load() -> Self {
        Self::dir()
            .map(|dir| Self::load_from(&dir.join(CONFIG_FILE)))
            .unwrap_or_default()
    }

    /// Load from `path`; a missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Cannot read config {:?}: {}", path, e);
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Persist the non-secret settings to the default location
    pub fn save(&self) -> Result<()> {
        let dir = Self::dir().context("No config directory on this platform")?;
        self.save_to(&dir.join(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        tracing::info!("Saved connection defaults to {:?}", path);
        Ok(())
    }

    /// Overlay CLI values on top of the stored ones (CLI > config)
    pub fn merged(&self, cli: &Config) -> Config {
        Config {
            base_url: cli.base_url.clone().or_else(|| self.base_url.clone()),
            auth: cli.auth.or(self.auth),
            username: cli.username.clone().or_else(|| self.username.clone()),
            keycloak_url: cli.keycloak_url.clone().or_else(|| self.keycloak_url.clone()),
            realm: cli.realm.clone().or_else(|| self.realm.clone()),
            client_id: cli.client_id.clone().or_else(|| self.client_id.clone()),
            insecure: cli.insecure || self.insecure,
        }
    }

    /// Get effective base URL (CLI > config > default)
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Get effective auth scheme (CLI > config > basic)
    pub fn effective_auth(&self) -> AuthKind {
        self.auth.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_values_win() {
        let stored = Config {
            base_url: Some("https://stored/api".to_string()),
            auth: Some(AuthKind::Keycloak),
            realm: Some("manageiq".to_string()),
            insecure: true,
            ..Config::default()
        };
        let cli = Config {
            base_url: Some("https://cli/api".to_string()),
            ..Config::default()
        };

        let merged = stored.merged(&cli);
        assert_eq!(merged.effective_base_url(), "https://cli/api");
        assert_eq!(merged.effective_auth(), AuthKind::Keycloak);
        assert_eq!(merged.realm.as_deref(), Some("manageiq"));
        assert!(merged.insecure);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.effective_auth(), AuthKind::Basic);
    }

    #[test]
    fn test_round_trips_lowercase_auth() {
        let config: Config = serde_json::from_str(r#"{"auth":"bearer"}"#).unwrap();
        assert_eq!(config.auth, Some(AuthKind::Bearer));
        assert!(serde_json::to_string(&config).unwrap().contains(r#""auth":"bearer""#));
    }

    #[test]
    fn test_save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            base_url: Some("https://miq.example.com/api".to_string()),
            auth: Some(AuthKind::Keycloak),
            realm: Some("manageiq".to_string()),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_missing_or_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
