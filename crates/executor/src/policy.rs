use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;

/// Classifies an operation error as worth retrying or not.
pub trait Retryable {
    /// Returns `true` if the failure is transient and the same call may
    /// succeed on a later attempt.
    fn is_retryable(&self) -> bool;
}

/// Why a single attempt failed.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// The operation returned an error.
    Failed(E),
    /// The attempt did not finish within the configured attempt timeout.
    TimedOut(Duration),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => err.fmt(f),
            Self::TimedOut(after) => write!(f, "attempt timed out after {after:?}"),
        }
    }
}

/// Classified result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded.
    Succeeded { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted {
        attempts: u32,
        last_error: AttemptError<E>,
    },
    /// An attempt failed with a non-retryable error; no further attempts
    /// were made.
    Aborted { attempts: u32, error: E },
}

/// Runs an async operation up to a bounded number of attempts, sleeping
/// between attempts according to the configured
/// [`RetryStrategy`](crate::RetryStrategy).
///
/// Only errors reporting [`Retryable::is_retryable`] (and attempt timeouts)
/// are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Run `operation`, passing it the zero-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            let result = match self.config.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, operation(attempt)).await {
                    Ok(result) => result.map_err(AttemptError::Failed),
                    Err(_elapsed) => Err(AttemptError::TimedOut(limit)),
                },
                None => operation(attempt).await.map_err(AttemptError::Failed),
            };

            let last_error = match result {
                Ok(value) => {
                    debug!(attempt, "attempt succeeded");
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt + 1,
                    };
                }
                Err(AttemptError::Failed(err)) if !err.is_retryable() => {
                    warn!(attempt, error = %err, "non-retryable error, giving up");
                    return RetryOutcome::Aborted {
                        attempts: attempt + 1,
                        error: err,
                    };
                }
                Err(err) => err,
            };

            if attempt + 1 >= max_attempts {
                warn!(
                    attempts = attempt + 1,
                    error = %last_error,
                    "retries exhausted"
                );
                return RetryOutcome::Exhausted {
                    attempts: attempt + 1,
                    last_error,
                };
            }

            let delay = self.config.retry_strategy.delay_for(attempt);
            warn!(
                attempt,
                error = %last_error,
                delay_ms = %delay.as_millis(),
                "retryable error, will retry"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
