//! Configuration management for the Climate Policy Maker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with CPM_ prefix

use config::builder::{ConfigBuilder, DefaultState};
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Rule catalog sources
    pub catalog: CatalogConfig,

    /// Report output
    pub report: ReportConfig,

    /// Optional LLM elaboration
    pub elaboration: ElaborationConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Overlay TOML file appended to the catalog
    pub path: Option<String>,

    /// Start from the embedded default catalog
    pub include_builtin: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Directory exported reports are written to
    pub output_dir: String,

    /// Default export format (markdown, json, csv)
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ElaborationConfig {
    pub enabled: bool,

    /// Chat-completions compatible API root
    #[validate(url)]
    pub api_base_url: String,

    pub api_key: Option<String>,

    #[validate(length(min = 1))]
    pub model: String,

    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,

    #[validate(range(min = 1, max = 16384))]
    pub max_tokens: u32,

    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> AppResult<Self> {
        let environment = std::env::var("CPM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::with_defaults(config::Config::builder(), &environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CPM_ prefix)
            .add_source(
                Environment::with_prefix("CPM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config)
    }

    /// Configuration built from in-code defaults only
    pub fn defaults(environment: &str) -> AppResult<Self> {
        let config = Self::with_defaults(config::Config::builder(), environment)?.build()?;
        Self::finish(config)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
        environment: &str,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("catalog.include_builtin", true)?
            .set_default("report.output_dir", "reports")?
            .set_default("report.format", "markdown")?
            .set_default("elaboration.enabled", false)?
            .set_default("elaboration.api_base_url", "https://api.aimlapi.com/v1")?
            .set_default("elaboration.model", "gpt-4o-mini")?
            .set_default("elaboration.temperature", 0.4)?
            .set_default("elaboration.max_tokens", 1000)?
            .set_default("elaboration.timeout_secs", 60)
    }

    fn finish(config: config::Config) -> AppResult<Self> {
        let config: Config = config.try_deserialize()?;
        config
            .elaboration
            .validate()
            .map_err(|e| AppError::Configuration(format!("elaboration: {}", e)))?;
        Ok(config)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "reports".to_string(),
            format: "markdown".to_string(),
        }
    }
}

impl Default for ElaborationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: "https://api.aimlapi.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::defaults("test").unwrap();

        assert_eq!(config.environment, "test");
        assert!(config.catalog.include_builtin);
        assert!(config.catalog.path.is_none());
        assert_eq!(config.report.format, "markdown");
        assert!(!config.elaboration.enabled);
        assert_eq!(config.elaboration.model, "gpt-4o-mini");
        assert_eq!(config.elaboration.max_tokens, 1000);
        assert_eq!(config.elaboration.timeout_secs, 60);
    }

    #[test]
    fn test_elaboration_ranges() {
        assert!(ElaborationConfig::default().validate().is_ok());

        let hot = ElaborationConfig {
            temperature: 3.5,
            ..ElaborationConfig::default()
        };
        assert!(hot.validate().is_err());

        let no_url = ElaborationConfig {
            api_base_url: "not a url".to_string(),
            ..ElaborationConfig::default()
        };
        assert!(no_url.validate().is_err());
    }
}
