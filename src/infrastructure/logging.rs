//! Logging system configuration and initialization
//!
//! Console output by default, with an optional non-blocking log file that
//! can be written as JSON. `RUST_LOG` overrides the configured filter.

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::infrastructure::config::LoggingConfig;

/// Log file written when file output is enabled
pub const LOG_FILE_NAME: &str = "job-scraper.log";

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter used when `RUST_LOG` is not set.
///
/// Unless the level is `trace`, HTTP client internals are clamped so page
/// fetches don't drown the run's own progress lines.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut directives = vec![config.level.clone()];

    if !config.level.to_lowercase().contains("trace") {
        directives.extend(
            ["reqwest=info", "hyper=warn", "hyper_util=warn", "h2=warn", "html5ever=warn", "selectors=warn"]
                .map(String::from),
        );
    }

    let mut filters: Vec<_> = config.module_filters.iter().collect();
    filters.sort();
    directives.extend(filters.into_iter().map(|(module, level)| format!("{module}={level}")));

    EnvFilter::try_new(directives.join(",")).map_err(|e| anyhow!("Invalid log filter: {}", e))
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(config)?,
    };
    let registry = Registry::default().with(env_filter);
    let log_dir = config.log_dir.clone().unwrap_or_else(get_log_directory);

    match (config.file_output, config.console_output) {
        (true, console) => {
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

            let file_appender = rolling::never(&log_dir, LOG_FILE_NAME);
            let (file_writer, file_guard) = non_blocking(file_appender);

            // Store the guard globally to prevent it from being dropped
            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                });
                registry
                    .with(file_layer)
                    .with(console_layer)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_target(false)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                });
                registry
                    .with(file_layer)
                    .with(console_layer)
                    .try_init()
                    .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
            }
        }
        (false, true) => {
            // Console output only
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_target(false);
            registry
                .with(console_layer)
                .try_init()
                .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(LOG_FILE_NAME));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_log_directory_is_named_logs() {
        assert!(get_log_directory().to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_filter_includes_module_overrides() {
        let mut config = LoggingConfig::default();
        config.module_filters.insert("job_scraper_lib".into(), "debug".into());

        let filter = build_env_filter(&config).unwrap().to_string();
        assert!(filter.contains("job_scraper_lib=debug"));
        assert!(filter.contains("hyper=warn"));
    }

    #[test]
    fn test_trace_level_keeps_dependencies_verbose() {
        let config = LoggingConfig {
            level: "trace".into(),
            ..LoggingConfig::default()
        };

        let filter = build_env_filter(&config).unwrap().to_string();
        assert!(!filter.contains("hyper=warn"));
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }

    // The only test in this crate that installs the global subscriber
    #[test]
    fn test_file_and_console_logging_installs() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = LoggingConfig {
            file_output: true,
            json_format: true,
            log_dir: Some(dir.path().join("logs")),
            ..LoggingConfig::default()
        };

        init_logging_with_config(&config).unwrap();

        assert!(dir.path().join("logs").join(LOG_FILE_NAME).exists());
        assert!(init_logging_with_config(&config).is_err());
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        let config = LoggingConfig {
            level: "loud=[[".into(),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(&config).is_err());
    }
}
