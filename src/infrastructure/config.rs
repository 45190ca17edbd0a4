//! Configuration infrastructure
//!
//! Settings are layered: built-in defaults, then the JSON config file, then
//! `JOB_SCRAPER_*` environment variables (`JOB_SCRAPER_RETRY__MAX_RETRIES=3`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::domain::constants::{challenge, site};
use crate::infrastructure::retry_policy::RetryPolicy;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "JOB_SCRAPER";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote challenge service settings
    pub challenge: ChallengeConfig,

    /// Page fan-out settings
    pub scraping: ScrapingConfig,

    /// Page fetch retry policy
    pub retry: RetryPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote challenge service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    /// API base URL; relative endpoint paths are joined onto it
    pub base_url: String,

    /// Identity sent when requesting the manifest
    pub email: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent string
    pub user_agent: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            base_url: challenge::BASE_URL.to_string(),
            email: "example@example.com".to_string(),
            request_timeout_seconds: challenge::REQUEST_TIMEOUT_SECONDS,
            user_agent: format!("job-scraper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Page fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Listings per page; the page count is `ceil(manifest / page_size)`
    pub page_size: usize,

    /// Cap on in-flight page tasks; `None` launches every page at once
    pub max_concurrent_pages: Option<usize>,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            page_size: site::JOBS_PER_PAGE,
            max_concurrent_pages: None,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Write the log file as JSON
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for the log file; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            module_filters: HashMap::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to write configuration file {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to get user config directory")]
    NoConfigDir,
}

impl AppConfig {
    /// Reject settings the run controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraping.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "scraping.page_size",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.scraping.max_concurrent_pages == Some(0) {
            return Err(ConfigError::Invalid {
                field: "scraping.max_concurrent_pages",
                reason: "must be at least 1 when set".to_string(),
            });
        }

        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid {
                field: "retry.min_delay_ms",
                reason: format!(
                    "{} exceeds retry.max_delay_ms {}",
                    self.retry.min_delay_ms, self.retry.max_delay_ms
                ),
            });
        }

        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                field: "retry.backoff_multiplier",
                reason: format!("{} is not a finite value >= 1.0", self.retry.backoff_multiplier),
            });
        }

        if self.challenge.email.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "challenge.email",
                reason: "must not be empty".to_string(),
            });
        }

        if url::Url::parse(&self.challenge.base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "challenge.base_url",
                reason: format!("'{}' is not an absolute URL", self.challenge.base_url),
            });
        }

        Ok(())
    }
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("job-scraper"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Configuration manager for the default per-user config file
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_dir()?.join("job_scraper_config.json");
        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit config file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the default configuration if no config file exists yet, then load.
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_path.exists() {
            info!("🎉 First run detected - writing default configuration");
            self.save_config(&AppConfig::default()).await?;
        }

        self.load_config()
    }

    /// Load defaults, the config file (if present) and environment overrides.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(self.config_path.as_path())
                    .format(config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;

        info!("✅ Configuration loaded from {:?}", self.config_path);
        Ok(app_config)
    }

    /// Save configuration as pretty JSON
    pub async fn save_config(&self, app_config: &AppConfig) -> Result<(), ConfigError> {
        let write_error = |reason: String| ConfigError::Write {
            path: self.config_path.clone(),
            reason,
        };

        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| write_error(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(app_config).map_err(|e| write_error(e.to_string()))?;
        fs::write(&self.config_path, json)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        info!("💾 Configuration saved to {:?}", self.config_path);
        Ok(())
    }
}
