use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fulfillment_core::{CommitEnvelope, CommitReply, CommitResponse, ResponseEnvelope};

/// Source of the completion timestamp.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Builds reply envelopes from inbound ones.
///
/// Every reply keeps the inbound trace fields and carries the inbound
/// request; the completion time is taken from the clock at composition.
#[derive(Clone)]
pub struct ResponseComposer {
    clock: Clock,
}

impl ResponseComposer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn success(&self, envelope: CommitEnvelope, response: CommitResponse) -> CommitReply {
        self.complete(envelope.map_payload(|request| ResponseEnvelope::success(request, response)))
    }

    pub fn malformed(&self, envelope: CommitEnvelope, reason: impl Into<String>) -> CommitReply {
        self.complete(envelope.map_payload(|request| ResponseEnvelope::malformed(request, reason)))
    }

    pub fn internal_error(
        &self,
        envelope: CommitEnvelope,
        message: impl Into<String>,
    ) -> CommitReply {
        self.complete(
            envelope.map_payload(|request| ResponseEnvelope::internal_error(request, message)),
        )
    }

    /// Turn an already composed reply into an internal-error reply with the
    /// same request and trace.
    pub fn downgrade(&self, mut reply: CommitReply, message: impl Into<String>) -> CommitReply {
        let message = message.into();
        reply.payload = Some(match reply.payload.take() {
            Some(payload) => payload.into_internal_error(message),
            None => ResponseEnvelope::internal_error(None, message),
        });
        self.complete(reply)
    }

    fn complete(&self, mut reply: CommitReply) -> CommitReply {
        reply.completion_time = Some((self.clock)());
        reply
    }
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResponseComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseComposer").finish_non_exhaustive()
    }
}
