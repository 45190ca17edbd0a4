//! Retry policy - exponential backoff for page fetches
//!
//! Wraps one fallible async operation in bounded retry-with-backoff. An attempt
//! fails only when the operation returns `Err`; the first `Ok` resolves the
//! policy. Exhaustion and cancellation are terminal `RetryError`s, so a caller
//! always gets an answer.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::constants::retry as defaults;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt
    pub max_retries: u32,
    /// Minimum delay in milliseconds
    pub min_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (2.0 doubles the delay each retry)
    pub backoff_multiplier: f64,
    /// Jitter range in milliseconds, 0 disables jitter
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            min_delay_ms: defaults::DEFAULT_MIN_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: defaults::DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ms: 0,
        }
    }
}

/// Value produced by a successful attempt, with the number of attempts made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Terminal failure of a retried operation.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts } => *attempts,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts including the first one.
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Exponential backoff delay
    ///
    /// `retry` is 1-based: the delay before the first retry is `min_delay`.
    /// Jitter is added before capping, so the result never exceeds `max_delay`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.min_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let base_ms = if scaled.is_finite() {
            // float to int casts saturate
            scaled as u64
        } else {
            self.max_delay_ms
        };

        let jitter_ms = if self.jitter_ms > 0 {
            fastrand::u64(0..=self.jitter_ms)
        } else {
            0
        };

        Duration::from_millis(base_ms.saturating_add(jitter_ms).min(self.max_delay_ms))
    }

    /// Run `operation` until it returns `Ok`, the attempt budget runs out, or
    /// `cancel` fires. The operation receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                // The operation was not started, so this attempt does not count
                () = cancel.cancelled() => return Err(RetryError::Cancelled { attempts: attempt - 1 }),
                outcome = operation(attempt) => outcome,
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("✅ Succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(Retried { value, attempts: attempt });
                }
                Err(last_error) if attempt >= max_attempts => {
                    warn!("❌ Attempt {}/{} failed, giving up: {}", attempt, max_attempts, last_error);
                    return Err(RetryError::Exhausted { attempts: attempt, last_error });
                }
                Err(error) => {
                    let delay = self.delay_for_retry(attempt);
                    warn!(
                        "🔄 Attempt {}/{} failed, retrying in {:?}: {}",
                        attempt, max_attempts, delay, error
                    );

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(RetryError::Cancelled { attempts: attempt }),
                        () = sleep(delay) => {}
                    }
                }
            }
        }
    }
}
