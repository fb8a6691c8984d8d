pub mod config;
pub mod policy;
pub mod retry;

pub use config::RetryConfig;
pub use policy::{AttemptError, RetryOutcome, RetryPolicy, Retryable};
pub use retry::RetryStrategy;
