//! Configuration Management
//!
//! Provider settings: where the platform lives and how to authenticate.
//! Values come from the command line, then the environment, then the
//! config file under the user's config directory.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const URL_ENV: &str = "PROJECTS_URL";
pub const ACCESS_TOKEN_ENV: &str = "PROJECTS_ACCESS_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Platform base URL, e.g. https://example.jfrog.io
    #[serde(default)]
    pub url: Option<String>,
    /// Access token used as bearer token
    #[serde(default)]
    pub access_token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("access-projects").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
            Self::default()
        })
    }

    /// Load configuration from a specific file; a missing file is the default config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Overlay values from `PROJECTS_URL` / `PROJECTS_ACCESS_TOKEN`
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(URL_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        )
    }

    /// Overlay explicitly given values; empty strings are ignored
    pub fn with_overrides(mut self, url: Option<String>, access_token: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.url = Some(url);
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
        self
    }

    /// Get effective platform URL
    pub fn effective_url(&self) -> Result<String> {
        self.url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("No platform URL configured. Set {} or use --url", URL_ENV))
    }

    /// Get effective access token (empty when unauthenticated)
    pub fn effective_token(&self) -> String {
        self.access_token.clone().unwrap_or_default()
    }

    /// Get effective request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Read a declarative file as YAML (`.yaml`/`.yml`) or JSON (anything else)
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML {:?}", path))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON {:?}", path))
    }
}
