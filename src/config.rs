use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::retry::RetryConfig;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_CONCURRENCY_MAX_RETRIES: u32 = 3;
const DEFAULT_CONCURRENCY_RETRY_DELAY_MS: u64 = 0;
const DEFAULT_ORDER_NUMBER_PREFIX: &str = "ORD";
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Retries after the first attempt when a goal set was modified
    /// concurrently
    #[serde(default = "default_concurrency_max_retries")]
    #[validate(range(min = 0, max = 10))]
    pub concurrency_max_retries: u32,

    /// Pause between concurrency retries, 0 = retry immediately
    #[serde(default = "default_concurrency_retry_delay_ms")]
    #[validate(range(max = 10000))]
    pub concurrency_retry_delay_ms: u64,

    /// Prefix for generated order numbers
    #[serde(default = "default_order_number_prefix")]
    #[validate(length(min = 1, max = 10))]
    pub order_number_prefix: String,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            concurrency_max_retries: default_concurrency_max_retries(),
            concurrency_retry_delay_ms: default_concurrency_retry_delay_ms(),
            order_number_prefix: default_order_number_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Retry settings for goal-set commands.
    pub fn retry_config(&self) -> RetryConfig {
        let delay = Duration::from_millis(self.concurrency_retry_delay_ms);
        RetryConfig {
            max_attempts: self.concurrency_max_retries + 1,
            initial_delay: delay,
            max_delay: delay.max(RetryConfig::default().max_delay),
            ..RetryConfig::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_concurrency_max_retries() -> u32 {
    DEFAULT_CONCURRENCY_MAX_RETRIES
}

fn default_concurrency_retry_delay_ms() -> u64 {
    DEFAULT_CONCURRENCY_RETRY_DELAY_MS
}

fn default_order_number_prefix() -> String {
    DEFAULT_ORDER_NUMBER_PREFIX.to_string()
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 || capacity > 100_000 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be between 1 and 100000".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("aggregate_workflows={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] with an explicit config directory.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_allow_four_attempts_without_backoff() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());

        let retry = cfg.retry_config();
        assert_eq!(retry.max_attempts, 4);
        assert!(retry.initial_delay.is_zero());
    }

    #[test]
    fn missing_directory_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("absent")).unwrap();
        assert_eq!(cfg.order_number_prefix, "ORD");
        assert_eq!(cfg.concurrency_max_retries, 3);
    }

    #[test]
    fn default_file_overrides_builtins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "log_level = \"debug\"\nconcurrency_max_retries = 1\norder_number_prefix = \"TAB\"\n",
        )
        .unwrap();

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.retry_config().max_attempts, 2);
        assert_eq!(cfg.order_number_prefix, "TAB");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "log_level = \"verbose\"\nevent_channel_capacity = 0\n",
        )
        .unwrap();

        let err = load_config_from(dir.path()).unwrap_err();
        assert!(matches!(err, AppConfigError::Validation(_)));
    }

    #[test]
    fn event_channel_capacity_bounds() {
        let mut cfg = AppConfig::default();
        cfg.event_channel_capacity = 1;
        assert!(cfg.validate().is_ok());
        cfg.event_channel_capacity = 100_000;
        assert!(cfg.validate().is_ok());

        cfg.event_channel_capacity = 0;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("event_channel_capacity"));
        cfg.event_channel_capacity = 100_001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.toml"), "database_url = \"x\"\n").unwrap();
        assert!(matches!(
            load_config_from(dir.path()),
            Err(AppConfigError::Load(_))
        ));
    }
}
