//! Infrastructure layer for the challenge service, parsing, retries,
//! configuration and logging

pub mod challenge_client; // reqwest-backed service client
pub mod config;
pub mod logging;
pub mod parsing;
pub mod retry_policy;

// Re-export commonly used items
pub use challenge_client::{ChallengeClient, ClientError, HttpChallengeClient};
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{JobListParser, PageExtractor, ParsingError, ParsingResult};
pub use retry_policy::{Retried, RetryError, RetryPolicy};
