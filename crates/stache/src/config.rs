//! Configuration handling for the Stache CLI.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stache_registry::Settings;
use stache_store::StoreConfig;
use std::path::PathBuf;
use tracing::Level;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider selection and per-provider options
    #[serde(default)]
    pub providers: Settings,

    /// Vector store contract settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log level.
    pub fn level(&self) -> Result<Level> {
        self.level
            .parse()
            .with_context(|| format!("Invalid log level '{}'", self.level))
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when no
    /// file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path.or_else(Self::config_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a TOML document.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Default config file path.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample configuration file.
    pub fn sample_toml() -> &'static str {
        r#"# Stache configuration

[providers]
llm_provider = "echo"
embedding_provider = "hashing"
vectordb_provider = "memory"
namespace_provider = "memory"
document_index_provider = "memory"

[providers.options.embedding.hashing]
dimension = 384

# A write-once backend without namespaces or native update
[providers.options.vectordb.memory-immutable]
max_batch_size = 1000

[store]
# Candidates fetched per result when filtering client-side
overfetch_factor = 4
max_concurrency = 4

[store.retry]
max_attempts = 3
initial_backoff_ms = 100
max_backoff_ms = 5000

[store.update]
emulate = true
# Reconciliation passes before an update consistency error surfaces
reconcile_attempts = 0

[logging]
level = "info"
"#
    }
}

/// Get the XDG config directory for Stache.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("STACHE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "stache").map(|dirs| dirs.config_dir().to_path_buf())
}
