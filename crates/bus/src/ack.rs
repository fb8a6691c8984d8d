use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use fulfillment_core::ReplyStatus;
use thiserror::Error;

/// Failure to resolve an acknowledgment handle against the broker.
#[derive(Debug, Error)]
pub enum AckError {
    #[error("failed to commit offset: {0}")]
    Commit(String),

    #[error("failed to rewind for redelivery: {0}")]
    Seek(String),
}

impl AckError {
    /// The consumer may already be positioned past the record, so polling
    /// on would skip it for good.
    pub fn loses_record(&self) -> bool {
        matches!(self, Self::Seek(_))
    }
}

/// Handle bound to one consumed record.
///
/// Both methods consume the handle, so a record is resolved exactly once.
#[async_trait]
pub trait Acknowledgment: Send {
    /// Mark the record processed; it will not be delivered again.
    async fn ack(self: Box<Self>) -> Result<(), AckError>;

    /// Reject the record; it is delivered again after `delay`.
    async fn nack(self: Box<Self>, delay: Duration) -> Result<(), AckError>;
}

/// Terminal decision for one delivered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A reply with `reply` status was published; commit the offset.
    Ack { reply: ReplyStatus },
    /// Nothing was published; redeliver after `delay`.
    Nack { delay: Duration },
}

impl Disposition {
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack { .. })
    }

    /// Apply this decision to `handle`.
    pub async fn resolve(self, handle: Box<dyn Acknowledgment>) -> Result<(), AckError> {
        match self {
            Self::Ack { .. } => handle.ack().await,
            Self::Nack { delay } => handle.nack(delay).await,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack { reply } => write!(f, "ack ({reply})"),
            Self::Nack { delay } => write!(f, "nack ({}ms)", delay.as_millis()),
        }
    }
}
