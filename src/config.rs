//! Configuration management for the POI sweep
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SweepError;
use crate::models::{BoundingBox, EV_CHARGING_CATEGORY, SearchFilter};
use crate::output::OutputFormat;
use crate::search::SweepOptions;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the POI sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Search API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Filter and region of the sweep
    #[serde(default)]
    pub search: SearchConfig,
    /// Query throttling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Subdivision limits
    #[serde(default)]
    pub sweep: SweepLimitsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Output files
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// TomTom API key
    pub api_key: Option<String>,
    /// Base URL for the search API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Free-text query sent with the category filter
    #[serde(default = "default_api_query")]
    pub query: String,
    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 = fail the region immediately)
    #[serde(default)]
    pub max_retries: u32,
}

/// Filter and region of one sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Country code (ISO 3166-1 alpha-2)
    #[serde(default = "default_country")]
    pub country: String,
    /// POI category id
    #[serde(default = "default_category")]
    pub category: u32,
    /// Minimum connector power in kW
    #[serde(default)]
    pub min_power_kw: f64,
    /// Results per query, capped by the API at 100
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Root region as `[north, west, south, east]`
    #[serde(default)]
    pub bounds: BoundingBox,
}

/// Query throttling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum time between two queries in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

/// Limits for regions that stay under-covered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepLimitsConfig {
    /// Regions at or below this span (degrees) are not split further
    #[serde(default = "default_min_span_degrees")]
    pub min_span_degrees: f64,
    /// Maximum subdivision depth
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path without extension; `.json` / `.csv` are appended
    #[serde(default = "default_output_basename")]
    pub basename: PathBuf,
    /// Which files to write
    #[serde(default)]
    pub format: OutputFormat,
}

// Default value functions
fn default_api_base_url() -> String {
    "https://api.tomtom.com".to_string()
}

fn default_api_query() -> String {
    "Charging Station".to_string()
}

fn default_api_timeout() -> u32 {
    30
}

fn default_country() -> String {
    "DE".to_string()
}

fn default_category() -> u32 {
    EV_CHARGING_CATEGORY
}

fn default_limit() -> u32 {
    100
}

fn default_min_interval_ms() -> u64 {
    250
}

fn default_min_span_degrees() -> f64 {
    crate::search::region_searcher::DEFAULT_MIN_SPAN_DEGREES
}

fn default_max_depth() -> u32 {
    crate::search::region_searcher::DEFAULT_MAX_DEPTH
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_output_basename() -> PathBuf {
    PathBuf::from("data/chargers")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_api_base_url(),
            query: default_api_query(),
            timeout_seconds: default_api_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            category: default_category(),
            min_power_kw: 0.0,
            limit: default_limit(),
            bounds: BoundingBox::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl Default for SweepLimitsConfig {
    fn default() -> Self {
        Self {
            min_span_degrees: default_min_span_degrees(),
            max_depth: default_max_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            basename: default_output_basename(),
            format: OutputFormat::default(),
        }
    }
}

impl SweepConfig {
    /// Load configuration from file and environment variables.
    ///
    /// An explicit `config_path` must exist; the default location is optional.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let required = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if required && !config_file.is_file() {
            anyhow::bail!("Config file not found: {}", config_file.display());
        }

        builder = builder.add_source(
            File::from(config_file.clone())
                .required(required)
                .format(config::FileFormat::Toml),
        );

        // POISWEEP_API__API_KEY, POISWEEP_SEARCH__COUNTRY, ...
        builder = builder.add_source(
            Environment::with_prefix("POISWEEP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SweepConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("poi-sweep").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_api_base_url();
        }
        if self.api.query.is_empty() {
            self.api.query = default_api_query();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_api_timeout();
        }
        if self.search.country.is_empty() {
            self.search.country = default_country();
        }
        if self.search.limit == 0 {
            self.search.limit = default_limit();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.output.basename.as_os_str().is_empty() {
            self.output.basename = default_output_basename();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// A configured API key must look plausible; a missing one is checked by [`Self::require_api_key`].
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.api.api_key {
            if api_key.trim().is_empty() {
                return Err(SweepError::config(
                    "API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(SweepError::config(
                    "API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(SweepError::config(
                    "API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// The API key, or a configuration error telling the user how to set one
    pub fn require_api_key(&self) -> Result<&str> {
        self.api.api_key.as_deref().ok_or_else(|| {
            SweepError::config(
                "An API key is required. Set api.api_key, POISWEEP_API__API_KEY or --api-key.",
            )
            .into()
        })
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(SweepError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.api.max_retries > 10 {
            return Err(SweepError::config("API max retries cannot exceed 10").into());
        }

        if !(1..=100).contains(&self.search.limit) {
            return Err(SweepError::config("Search limit must be between 1 and 100").into());
        }

        if !self.search.min_power_kw.is_finite() || self.search.min_power_kw < 0.0 {
            return Err(SweepError::config("Minimum power must be a non-negative number").into());
        }

        if self.rate_limit.min_interval_ms > 60_000 {
            return Err(
                SweepError::config("Rate limit interval cannot exceed 60000 ms").into(),
            );
        }

        if !self.sweep.min_span_degrees.is_finite() || self.sweep.min_span_degrees <= 0.0 {
            return Err(SweepError::config("Minimum span must be a positive number of degrees").into());
        }

        if !(1..=64).contains(&self.sweep.max_depth) {
            return Err(SweepError::config("Maximum depth must be between 1 and 64").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SweepError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SweepError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(
                SweepError::config("API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        if !self
            .search
            .country
            .split(',')
            .all(|code| (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(SweepError::config(format!(
                "Invalid country code '{}'. Use ISO 3166-1 codes such as DE or DE,AT",
                self.search.country
            ))
            .into());
        }

        Ok(())
    }

    /// The constant filter for the sweep
    #[must_use]
    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::new(
            self.search.country.clone(),
            self.search.category,
            self.search.min_power_kw,
            self.search.limit,
        )
    }

    #[must_use]
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            min_span_degrees: self.sweep.min_span_degrees,
            max_depth: self.sweep.max_depth,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit.min_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert_eq!(config.api.base_url, "https://api.tomtom.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.search.country, "DE");
        assert_eq!(config.search.category, 7309);
        assert_eq!(config.search.limit, 100);
        assert_eq!(config.search.bounds, BoundingBox::GERMANY);
        assert_eq!(config.rate_limit.min_interval_ms, 250);
        assert_eq!(config.logging.level, "info");
        assert!(config.api.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_require_api_key() {
        let mut config = SweepConfig::default();
        assert!(config.require_api_key().is_err());
        config.api.api_key = Some("valid_api_key_123".to_string());
        assert_eq!(config.require_api_key().unwrap(), "valid_api_key_123");
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = SweepConfig::default();
        config.api.api_key = Some("short".to_string());
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SweepConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SweepConfig::default();
        config.search.limit = 500;
        assert!(config.validate().unwrap_err().to_string().contains("limit"));

        let mut config = SweepConfig::default();
        config.sweep.min_span_degrees = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_country() {
        let mut config = SweepConfig::default();
        config.search.country = "DE,AT".to_string();
        assert!(config.validate().is_ok());
        config.search.country = "Germany".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
api_key = "file_api_key_123"

[search]
country = "AT"
min_power_kw = 50.0
bounds = [49.02, 9.53, 46.37, 17.16]

[rate_limit]
min_interval_ms = 300
"#
        )
        .unwrap();

        let config = SweepConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("file_api_key_123"));
        assert_eq!(config.search.country, "AT");
        assert_eq!(config.search.min_power_kw, 50.0);
        assert_eq!(config.search.bounds.north(), 49.02);
        assert_eq!(config.min_interval(), Duration::from_millis(300));
        assert_eq!(config.search.limit, 100);
        assert_eq!(config.search_filter().country, "AT");
    }

    #[test]
    fn test_load_rejects_inverted_bounds() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[search]\nbounds = [40.0, 5.0, 50.0, 10.0]").unwrap();
        assert!(SweepConfig::load_from_path(Some(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_load_rejects_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let err = SweepConfig::load_from_path(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = SweepConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("poi-sweep"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
