use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Remote API endpoints and credentials
    pub api: ApiConfig,

    /// Refresh behavior for cached weather data
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Local snapshot store settings
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the weather API (current conditions and one-call forecast)
    pub weather_base_url: String,

    /// URL for the IP geolocation service
    pub geolocation_url: String,

    /// Weather API key (optional, can be set via environment)
    pub api_key: Option<String>,
}

/// What happens when an older refresh cycle finishes after a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapMode {
    /// Whichever write commits last is what the cache holds
    #[default]
    LastWriteWins,
    /// Writes from a cycle older than the last committed one are dropped
    NewestCycleWins,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Serve the cached snapshot without refetching while it is younger than
    /// this many minutes. 0 means refetch on every cycle.
    pub max_age_minutes: u32,

    /// Overlapping-cycle write policy
    #[serde(default)]
    pub overlap: OverlapMode,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: 0,
            overlap: OverlapMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Path to the SQLite snapshot database (default: data dir)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Database path to use, falling back to the platform data directory
    pub fn effective_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("skycast")
                .join("weather.db"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast");

        Self {
            config_dir,
            api: ApiConfig {
                weather_base_url: "https://api.openweathermap.org/data".to_string(),
                geolocation_url: "https://ipwho.is/".to_string(),
                api_key: std::env::var("SKYCAST_API_KEY").ok(), // Read from environment
            },
            refresh: RefreshConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.api.weather_base_url,
            "api.weather_base_url",
            &mut result,
        );
        self.validate_url(
            &self.api.geolocation_url,
            "api.geolocation_url",
            &mut result,
        );

        match &self.api.api_key {
            None => {
                result.add_warning(
                    "api.api_key",
                    "No API key configured - weather requests will be rejected",
                );
            }
            Some(key) if key.trim().is_empty() => {
                result.add_error("api.api_key", "API key is blank");
            }
            Some(_) => {}
        }

        if self.refresh.max_age_minutes > 1440 {
            result.add_warning(
                "refresh.max_age_minutes",
                "Cached weather older than 24 hours would still be served",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(
                    field_name,
                    format!("Invalid URL: {}", e),
                );
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.api.api_key = Some("0123456789abcdef".to_string());
        config
    }

    #[test]
    fn test_valid_default_config() {
        let config = config_with_key();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_weather_url() {
        let mut config = config_with_key();
        config.api.weather_base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.weather_base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = config_with_key();
        config.api.geolocation_url = "ftp://ipwho.is/".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let mut config = Config::default();
        config.api.api_key = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "api.api_key"));
    }

    #[test]
    fn test_blank_api_key_is_error() {
        let mut config = Config::default();
        config.api.api_key = Some("   ".to_string());
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_overlap_mode_parses_kebab_case() {
        let toml_str = r#"
            max_age_minutes = 30
            overlap = "newest-cycle-wins"
        "#;
        let refresh: RefreshConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(refresh.overlap, OverlapMode::NewestCycleWins);
        assert_eq!(refresh.max_age_minutes, 30);
    }

    #[test]
    fn test_effective_db_path_prefers_configured() {
        let store = StoreConfig {
            db_path: Some(PathBuf::from("/tmp/custom.db")),
        };
        assert_eq!(store.effective_db_path(), PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
