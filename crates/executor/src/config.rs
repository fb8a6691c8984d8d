use std::time::Duration;

use crate::retry::RetryStrategy;

/// Configuration for the [`RetryPolicy`](crate::RetryPolicy).
///
/// # Examples
///
/// ```
/// use fulfillment_executor::RetryConfig;
///
/// let config = RetryConfig::default();
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one. Values below one
    /// are treated as one.
    pub max_attempts: u32,
    /// Strategy used to compute the delay between attempts.
    pub retry_strategy: RetryStrategy,
    /// Upper bound on a single attempt. Elapsing counts as a retryable
    /// failure. `None` leaves bounding to the operation itself.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_strategy: RetryStrategy::default(),
            attempt_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.retry_strategy, RetryStrategy::default());
        assert!(cfg.attempt_timeout.is_none());
    }
}
