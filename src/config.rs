//! Configuration management for the travel curator
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CuratorError;
use crate::search::SearchSource;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the travel curator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Completion endpoint configuration
    pub llm: LlmConfig,
    /// Activity search and link checking
    pub search: SearchConfig,
    /// Web server settings
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default form values and limits
    pub defaults: DefaultsConfig,
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI compatible API
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures
    pub max_retries: u32,
    /// API key, falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    /// Always answer with the sample itinerary
    pub test_mode: bool,
    /// Substitute the sample itinerary when the endpoint fails
    pub fallback_to_sample: bool,
}

/// Activity search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Scrape TripAdvisor search pages to fill missing links
    pub scrape_enabled: bool,
    /// User agent for scraping and link checks
    pub user_agent: String,
    /// Timeout for scraping and link checks in seconds
    pub timeout_seconds: u32,
    /// Site scraped for TripAdvisor results (a mirror or proxy may stand in)
    pub tripadvisor_url: String,
    /// Site scraped for Viator results
    pub viator_url: String,
    /// CSS selector for result anchors on TripAdvisor search pages
    pub tripadvisor_selector: String,
    /// CSS selector for result anchors on Viator search pages
    pub viator_selector: String,
    /// Maximum scraped results per page
    pub max_results: usize,
    /// HEAD-check every link in the itinerary and unlink dead ones
    pub check_links: bool,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// Default form values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Pre-filled destination
    pub destination: String,
    /// Pre-filled preferences
    pub preferences: String,
    /// Pre-selected number of days
    pub days: u8,
    /// Upper bound of the day slider
    pub max_days: u8,
}

// Default value functions
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u32 {
    60
}

fn default_llm_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("TravelCurator/{}", crate::VERSION)
}

fn default_search_timeout() -> u32 {
    15
}

fn default_tripadvisor_url() -> String {
    SearchSource::Tripadvisor.site_root().to_string()
}

fn default_viator_url() -> String {
    SearchSource::Viator.site_root().to_string()
}

fn default_tripadvisor_selector() -> String {
    r#"a[href*="Attraction_Review"], a[href*="Restaurant_Review"]"#.to_string()
}

fn default_viator_selector() -> String {
    r#"a[href*="/tours/"]"#.to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_destination() -> String {
    "Madrid".to_string()
}

fn default_preferences() -> String {
    "See as many cats as possible, enjoy good food, and find swimming spots.".to_string()
}

fn default_days() -> u8 {
    1
}

fn default_max_days() -> u8 {
    7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_llm_max_retries(),
            api_key: None,
            test_mode: false,
            fallback_to_sample: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scrape_enabled: false,
            user_agent: default_user_agent(),
            timeout_seconds: default_search_timeout(),
            tripadvisor_url: default_tripadvisor_url(),
            viator_url: default_viator_url(),
            tripadvisor_selector: default_tripadvisor_selector(),
            viator_selector: default_viator_selector(),
            max_results: default_max_results(),
            check_links: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
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

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            preferences: default_preferences(),
            days: default_days(),
            max_days: default_max_days(),
        }
    }
}

impl LlmConfig {
    /// The configured key, or `OPENAI_API_KEY` from the environment
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl CuratorConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("config/default.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(CuratorError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVEL_CURATOR_LLM__MODEL=gpt-4o-mini
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_CURATOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CuratorConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-curator").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.search.user_agent.is_empty() {
            self.search.user_agent = default_user_agent();
        }
        if self.search.timeout_seconds == 0 {
            self.search.timeout_seconds = default_search_timeout();
        }
        if self.search.tripadvisor_url.is_empty() {
            self.search.tripadvisor_url = default_tripadvisor_url();
        }
        if self.search.viator_url.is_empty() {
            self.search.viator_url = default_viator_url();
        }
        if self.search.tripadvisor_selector.is_empty() {
            self.search.tripadvisor_selector = default_tripadvisor_selector();
        }
        if self.search.viator_selector.is_empty() {
            self.search.viator_selector = default_viator_selector();
        }
        if self.search.max_results == 0 {
            self.search.max_results = default_max_results();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.max_days == 0 {
            self.defaults.max_days = default_max_days();
        }
        if self.defaults.days == 0 {
            self.defaults.days = default_days();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// A configured key must look like one; a missing key is fine (test mode or fallback)
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.llm.api_key {
            if api_key.trim().is_empty() {
                return Err(CuratorError::config(
                    "LLM API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(CuratorError::config(
                    "LLM API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(CuratorError::config("LLM temperature must be between 0.0 and 2.0").into());
        }

        if self.llm.timeout_seconds > 600 {
            return Err(CuratorError::config("LLM timeout cannot exceed 600 seconds").into());
        }

        if self.llm.max_retries > 10 {
            return Err(CuratorError::config("LLM max retries cannot exceed 10").into());
        }

        if self.search.timeout_seconds > 120 {
            return Err(CuratorError::config("Search timeout cannot exceed 120 seconds").into());
        }

        if self.search.max_results > 50 {
            return Err(CuratorError::config("Search max results cannot exceed 50").into());
        }

        if self.defaults.max_days > 14 {
            return Err(CuratorError::config("Maximum days cannot exceed 14").into());
        }

        if self.defaults.days > self.defaults.max_days {
            return Err(CuratorError::config(format!(
                "Default days ({}) cannot exceed maximum days ({})",
                self.defaults.days, self.defaults.max_days
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CuratorError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CuratorError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let is_http = |url: &str| url.starts_with("http://") || url.starts_with("https://");
        if !is_http(&self.llm.base_url) {
            return Err(
                CuratorError::config("LLM base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }
        if !is_http(&self.search.tripadvisor_url) || !is_http(&self.search.viator_url) {
            return Err(
                CuratorError::config("Search site URLs must be valid HTTP or HTTPS URLs").into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CuratorConfig::default();
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.llm.fallback_to_sample);
        assert!(!config.search.scrape_enabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.destination, "Madrid");
        assert!(config.llm.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = CuratorConfig::default();
        config.llm.api_key = Some("sk".to_string());
        let result = config.validate_api_key();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        let mut config = CuratorConfig::default();
        config.llm.api_key = Some("sk-valid_api_key_123".to_string());
        assert!(config.validate_api_key().is_ok());
        assert_eq!(
            config.llm.resolve_api_key().as_deref(),
            Some("sk-valid_api_key_123")
        );
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CuratorConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = CuratorConfig::default();
        config.llm.timeout_seconds = 900;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = CuratorConfig::default();
        config.defaults.days = 9;
        config.defaults.max_days = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_site_urls_must_be_http() {
        let mut config = CuratorConfig::default();
        assert_eq!(config.search.tripadvisor_url, "https://www.tripadvisor.com");
        config.search.viator_url = "ftp://mirror.example".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Search site URLs"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = CuratorConfig::default();
        config.llm.model = String::new();
        config.defaults.max_days = 0;
        config.apply_defaults();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.defaults.max_days, 7);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = std::env::temp_dir().join(format!("travel-curator-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[llm]\nmodel = \"gpt-4o-mini\"\ntest_mode = true\n\n[server]\nport = 9000\n",
        )
        .unwrap();

        let config = CuratorConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.llm.test_mode);
        assert_eq!(config.server.port, 9000);
        // untouched sections keep their defaults
        assert_eq!(config.defaults.max_days, 7);
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let config = CuratorConfig::load_from_path(Some(PathBuf::from("config/default.toml"))).unwrap();
        let defaults = CuratorConfig::default();
        assert_eq!(config.llm.model, defaults.llm.model);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.search.tripadvisor_selector, defaults.search.tripadvisor_selector);
        assert_eq!(config.defaults.preferences, defaults.defaults.preferences);
    }

    #[test]
    fn test_load_from_missing_explicit_file() {
        let result = CuratorConfig::load_from_path(Some(PathBuf::from("/nonexistent/curator.toml")));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = CuratorConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("travel-curator"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
