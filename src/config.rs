//! YAML configuration for the classifier, keyword extraction and trends.
//!
//! Every section is optional; missing keys take the defaults below, so the
//! application runs without any config file at all. The model API key is
//! not read from this file; it comes from the CLI or the `GEMINI_API_KEY`
//! environment variable.
//!
//! ```yaml
//! classifier:
//!   endpoint: https://generativelanguage.googleapis.com/v1beta
//!   model: gemini-1.5-flash
//!   timeout_secs: 30
//!   concurrency: 4
//! keywords:
//!   article: { min_token_len: 2, limit: 50 }
//!   trends: { min_token_len: 2, limit: 20 }
//!   dashboard: { min_token_len: 3, limit: 30 }
//! trends:
//!   window_days: 30
//!   stable_band: 5.0
//!   confidence_threshold: 0.7
//! ```

use crate::error::ConfigError;
use crate::keywords::KeywordConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub keywords: KeywordSettings,
    pub trends: TrendSettings,
}

/// Model service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the Generative Language API.
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout; a timed-out call falls back to the heuristic scorer.
    pub timeout_secs: u64,
    /// Articles classified concurrently during bulk import.
    pub concurrency: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 30,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    pub article: KeywordConfig,
    pub trends: KeywordConfig,
    pub dashboard: KeywordConfig,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            article: KeywordConfig::ARTICLE,
            trends: KeywordConfig::TRENDS,
            dashboard: KeywordConfig::DASHBOARD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    /// Length of the trailing window used when no explicit range is given.
    pub window_days: u32,
    /// Net-positivity change, in percentage points, still reported as stable.
    pub stable_band: f64,
    /// Reported in the trend metadata for dashboard consumers.
    pub confidence_threshold: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            stable_band: 5.0,
            confidence_threshold: 0.7,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(path, model = %config.classifier.model, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };
        if self.classifier.model.trim().is_empty() {
            return invalid("classifier.model must not be empty");
        }
        if self.classifier.concurrency == 0 {
            return invalid("classifier.concurrency must be at least 1");
        }
        if self.classifier.timeout_secs == 0 {
            return invalid("classifier.timeout_secs must be at least 1");
        }
        let keyword_presets = [
            &self.keywords.article,
            &self.keywords.trends,
            &self.keywords.dashboard,
        ];
        if keyword_presets.iter().any(|preset| preset.limit == 0) {
            return invalid("keyword limits must be at least 1");
        }
        if self.trends.window_days == 0 {
            return invalid("trends.window_days must be at least 1");
        }
        if !(self.trends.stable_band >= 0.0) {
            return invalid("trends.stable_band must be a non-negative number");
        }
        Ok(())
    }
}
