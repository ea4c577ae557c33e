//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reelview_tui::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB connection settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Primary search list tuning.
    #[serde(default)]
    pub search: SearchConfig,
    /// Suggestions dropdown tuning.
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

/// TMDB connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// Bearer token; `TMDB_API_TOKEN` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Response language.
    pub language: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// API base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            language: String::from("en-US"),
            timeout_secs: 10,
            base_url: None,
        }
    }
}

/// Primary search list configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Number of results shown.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let defaults = PipelineConfig::search();
        Self {
            debounce_ms: u64::try_from(defaults.debounce.as_millis()).unwrap_or(500),
            limit: defaults.limit,
        }
    }
}

/// Suggestions dropdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SuggestionsConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Number of suggestions shown.
    pub limit: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        let defaults = PipelineConfig::suggestions();
        Self {
            debounce_ms: u64::try_from(defaults.debounce.as_millis()).unwrap_or(300),
            limit: defaults.limit,
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Copy with the API token masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.tmdb.api_token.is_some() {
            copy.tmdb.api_token = Some(String::from("********"));
        }
        copy
    }

    /// Tuning of the primary search pipeline.
    #[must_use]
    pub fn search_pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            limit: self.search.limit,
            ..PipelineConfig::search()
        }
    }

    /// Tuning of the suggestions pipeline.
    #[must_use]
    pub fn suggestions_pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            debounce: Duration::from_millis(self.suggestions.debounce_ms),
            limit: self.suggestions.limit,
            ..PipelineConfig::suggestions()
        }
    }
}
