use async_trait::async_trait;
use fulfillment_core::CommitReply;
use thiserror::Error;

/// Failure to publish a reply.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker did not confirm the write. Publishing the same reply again
    /// may succeed.
    #[error("reply not confirmed by broker: {0}")]
    Transient(String),

    /// The reply could not be serialized. Publishing it again will fail the
    /// same way.
    #[error("reply could not be encoded: {0}")]
    Encode(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Sends composed replies to the reply channel.
///
/// `publish` returns only once the broker has confirmed the write, so a
/// successful return means the reply is durable.
#[async_trait]
pub trait ReplyPublisher: Send + Sync {
    async fn publish(&self, reply: &CommitReply) -> Result<(), PublishError>;
}
