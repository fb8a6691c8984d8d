use thiserror::Error;

/// A structurally incomplete inbound message.
///
/// The reason names the first missing field and is returned verbatim to the
/// requester in the `MALFORMED` reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Malformed {
    reason: &'static str,
}

impl Malformed {
    pub(crate) const fn new(reason: &'static str) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Errors raised while assembling the pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required collaborator was not provided.
    #[error("configuration error: {0}")]
    Configuration(String),
}
