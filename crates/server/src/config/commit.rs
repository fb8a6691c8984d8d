use std::time::Duration;

use fulfillment_executor::{RetryConfig, RetryStrategy};
use fulfillment_transaction::HttpTransportConfig;
use serde::Deserialize;

/// Configuration of the outbound commit call.
///
/// # Example
///
/// ```toml
/// [commit]
/// url = "http://transactions:8080/CommitReservation"
/// connect_timeout_ms = 1000
/// connection_request_timeout_ms = 1000
/// timeout_ms = 1000
/// attempts = 3
/// backoff_delay_ms = 100
/// backoff_delay_max_ms = 500
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CommitConfig {
    /// Endpoint of the commit operation.
    #[serde(default = "default_commit_url")]
    pub url: String,
    /// Time allowed to establish a connection.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bound on one attempt, from issuing the call to the decoded answer.
    #[serde(default = "default_timeout_ms")]
    pub connection_request_timeout_ms: u64,
    /// Bound on the HTTP exchange itself.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Total attempts per commit, including the first.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_backoff_delay_ms")]
    pub backoff_delay_ms: u64,
    /// Upper bound on the delay between retries.
    #[serde(default = "default_backoff_delay_max_ms")]
    pub backoff_delay_max_ms: u64,
}

impl CommitConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.attempts,
            retry_strategy: RetryStrategy::exponential(
                Duration::from_millis(self.backoff_delay_ms),
                Duration::from_millis(self.backoff_delay_max_ms),
            ),
            attempt_timeout: Some(Duration::from_millis(self.connection_request_timeout_ms)),
        }
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            url: default_commit_url(),
            connect_timeout_ms: default_timeout_ms(),
            connection_request_timeout_ms: default_timeout_ms(),
            timeout_ms: default_timeout_ms(),
            attempts: default_attempts(),
            backoff_delay_ms: default_backoff_delay_ms(),
            backoff_delay_max_ms: default_backoff_delay_max_ms(),
        }
    }
}

fn default_commit_url() -> String {
    "http://localhost:8080/CommitReservation".to_owned()
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_delay_ms() -> u64 {
    100
}

fn default_backoff_delay_max_ms() -> u64 {
    500
}
