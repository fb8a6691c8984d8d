use fulfillment_executor::Retryable;
use thiserror::Error;

/// Transport-level failure of a single commit call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service could not be reached or the connection broke mid-call.
    #[error("connection error: {0}")]
    Connect(String),

    /// The call did not complete within the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The call could not be issued at all (bad URL, client misconfiguration).
    #[error("request error: {0}")]
    Request(String),
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Classified failure of the commit operation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Connectivity failures exhausted the retry budget. The same request
    /// may succeed on redelivery.
    #[error("Exhausted {attempts} attempts for POST {url}. {cause}")]
    Transient {
        attempts: u32,
        url: String,
        cause: String,
    },

    /// The service answered, but not with an acceptable outcome. Retrying
    /// the same request will not change the answer.
    #[error("{0}")]
    NonTransient(String),
}

impl InvokeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
