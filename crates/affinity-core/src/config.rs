//! `Affinity` configuration.
//!
//! Provides configuration file support via `affinity.toml` and environment
//! variables.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`AFFINITY_*`, sections separated by `__`,
//!    e.g. `AFFINITY_NEIGHBORHOOD__SIZE=20`)
//! 2. Configuration file (`affinity.toml`)
//! 3. Default values

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Which recommender to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommenderKind {
    /// Neighborhood of similar users (default).
    #[default]
    UserBased,
    /// Similarity between items.
    ItemBased,
    /// Average item-item preference diffs.
    SlopeOne,
    /// Mean preference of each item.
    ItemAverage,
    /// Item mean adjusted by the user's offset from the overall mean.
    ItemUserAverage,
}

/// Correlation metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMetric {
    /// Pearson product-moment correlation (default).
    #[default]
    Pearson,
    /// Spearman rank correlation. Users only.
    Spearman,
}

/// Preference transform applied before correlating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Raw values (default).
    #[default]
    None,
    /// Per-user z-score.
    Zscore,
    /// Inverse user frequency weighting.
    InverseUserFrequency,
}

/// Neighborhood strategy for user-based recommenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodKind {
    /// The `size` most similar users (default).
    #[default]
    NearestN,
    /// Every user at or above `threshold`.
    Threshold,
}

/// Recommender configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Recommender to build.
    pub kind: RecommenderKind,
    /// Wrap the recommender in a memoizing cache.
    pub cache: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            kind: RecommenderKind::UserBased,
            cache: true,
        }
    }
}

/// Correlation configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Correlation metric.
    pub metric: CorrelationMetric,
    /// Discount correlations computed from few overlapping ratings.
    pub weighted: bool,
    /// Infer missing preferences as the user's mean.
    pub infer_preferences: bool,
    /// Preference transform.
    pub transform: TransformKind,
    /// Logarithm base for inverse user frequency.
    pub log_base: f64,
    /// Case amplification factor (`None` = off).
    pub case_amplification: Option<f64>,
    /// Precompute the full item-item table (item-based only).
    pub precompute_items: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            metric: CorrelationMetric::Pearson,
            weighted: false,
            infer_preferences: false,
            transform: TransformKind::None,
            log_base: 10.0,
            case_amplification: None,
            precompute_items: false,
        }
    }
}

/// Neighborhood configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// Neighborhood strategy.
    pub kind: NeighborhoodKind,
    /// Maximum neighbors for `nearest_n`.
    pub size: usize,
    /// Minimum correlation for `threshold`.
    pub threshold: f64,
    /// Fraction of users considered, in (0, 1].
    pub sampling_rate: f64,
    /// Seed for reproducible sampling.
    pub seed: Option<u64>,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self {
            kind: NeighborhoodKind::NearestN,
            size: 10,
            threshold: 0.5,
            sampling_rate: 1.0,
            seed: None,
        }
    }
}

/// Slope-one configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeOneConfig {
    /// Weight diffs by the number of users behind them.
    pub weighted: bool,
    /// Further discount diffs by their standard deviation.
    pub std_dev_weighted: bool,
    /// Maximum tracked item pairs (`None` = unbounded).
    pub max_entries: Option<usize>,
}

impl Default for SlopeOneConfig {
    fn default() -> Self {
        Self {
            weighted: true,
            std_dev_weighted: true,
            max_entries: None,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `Affinity` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AffinityConfig {
    /// Recommender configuration.
    pub recommender: RecommenderConfig,
    /// Correlation configuration.
    pub correlation: CorrelationConfig,
    /// Neighborhood configuration.
    pub neighborhood: NeighborhoodConfig,
    /// Slope-one configuration.
    pub slope_one: SlopeOneConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AffinityConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < `affinity.toml` < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("affinity.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("AFFINITY_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let correlation = &self.correlation;
        if self.recommender.kind == RecommenderKind::ItemBased
            && correlation.metric == CorrelationMetric::Spearman
        {
            return Err(ConfigError::invalid(
                "correlation.metric",
                "spearman only correlates users; item_based needs pearson",
            ));
        }
        if correlation.transform == TransformKind::InverseUserFrequency
            && (correlation.log_base.is_nan() || correlation.log_base <= 1.0)
        {
            return Err(ConfigError::invalid(
                "correlation.log_base",
                format!("value {} must be greater than 1", correlation.log_base),
            ));
        }
        if let Some(factor) = correlation.case_amplification {
            if factor.is_nan() || factor == 0.0 {
                return Err(ConfigError::invalid(
                    "correlation.case_amplification",
                    format!("value {factor} must be a non-zero number"),
                ));
            }
        }

        let neighborhood = &self.neighborhood;
        if neighborhood.size == 0 {
            return Err(ConfigError::invalid("neighborhood.size", "value must be >= 1"));
        }
        if neighborhood.threshold.is_nan() {
            return Err(ConfigError::invalid("neighborhood.threshold", "value is NaN"));
        }
        if !(neighborhood.sampling_rate > 0.0 && neighborhood.sampling_rate <= 1.0) {
            return Err(ConfigError::invalid(
                "neighborhood.sampling_rate",
                format!("value {} is out of range (0, 1]", neighborhood.sampling_rate),
            ));
        }

        if self.slope_one.std_dev_weighted && !self.slope_one.weighted {
            return Err(ConfigError::invalid(
                "slope_one.std_dev_weighted",
                "requires slope_one.weighted",
            ));
        }
        if self.slope_one.max_entries == Some(0) {
            return Err(ConfigError::invalid("slope_one.max_entries", "value must be >= 1"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            ));
        }
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid(
                "logging.format",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            ));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
