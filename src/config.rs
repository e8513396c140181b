//! Layered configuration for the AutoMerge AI client.
//!
//! Settings are read from `automerge.toml` in the data directory, then
//! overridden by environment variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//!
//! [session]
//! store_file = "session.json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "automerge.toml";
pub const ENV_API_URL: &str = "AUTOMERGE_API_URL";
pub const ENV_DATA_DIR: &str = "AUTOMERGE_DATA_DIR";

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL the `/api/...` paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Persisted session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    /// File name (relative to the data directory) holding the stored user id
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_store_file() -> String {
    "session.json".to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
        }
    }
}

/// Contents of `automerge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomergeToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub session: SessionSection,
}

impl AutomergeToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse automerge.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize automerge.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(problem) = base_url_problem(&self.api.base_url) {
            warnings.push(format!(
                "Invalid api.base_url '{}': {}",
                self.api.base_url, problem
            ));
        }

        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs must be greater than 0".to_string());
        }

        if self.session.store_file.trim().is_empty() {
            warnings.push("session.store_file must not be empty".to_string());
        }

        warnings
    }
}

/// Why `base_url` cannot be used as the API root, if it cannot.
fn base_url_problem(base_url: &str) -> Option<String> {
    match reqwest::Url::parse(base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => None,
        Ok(url) => Some(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Some(e.to_string()),
    }
}

/// Default data directory: `<platform data dir>/automerge-ai`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("automerge-ai")
}

/// Effective configuration after applying file → env → CLI layering.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub toml: AutomergeToml,
    /// CLI override for the API base URL
    pub cli_api_url: Option<String>,
}

impl Config {
    /// Resolve the data directory (CLI → env → default) and load its config file.
    pub fn load(cli_data_dir: Option<PathBuf>, cli_api_url: Option<String>) -> Result<Self> {
        let data_dir = cli_data_dir
            .or_else(|| std::env::var(ENV_DATA_DIR).ok().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);
        let toml = AutomergeToml::load_or_default(&data_dir)?;

        Ok(Self {
            data_dir,
            toml,
            cli_api_url,
        })
    }

    /// Build a configuration without touching the filesystem.
    pub fn with_base_url(data_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            data_dir,
            toml: AutomergeToml::default(),
            cli_api_url: Some(base_url.into()),
        }
    }

    /// API base URL (CLI → env → file), without a trailing slash.
    pub fn api_base_url(&self) -> String {
        let url = self
            .cli_api_url
            .clone()
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .unwrap_or_else(|| self.toml.api.base_url.clone());
        url.trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.api.timeout_secs.max(1))
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join(&self.toml.session.store_file)
    }

    /// File warnings plus a check of the URL actually used when an env or CLI
    /// override replaces the file's.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        let effective = self.api_base_url();
        if effective != self.toml.api.base_url.trim_end_matches('/') {
            if let Some(problem) = base_url_problem(&effective) {
                warnings.push(format!("Invalid API URL override '{}': {}", effective, problem));
            }
        }
        warnings
    }
}
