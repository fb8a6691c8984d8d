use serde::{Deserialize, Serialize};

use crate::commit::{CommitRequest, CommitResponse};
use crate::envelope::TraceableEnvelope;

/// Terminal status of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStatus {
    Success,
    /// The inbound message was structurally incomplete.
    Malformed,
    /// The request was well formed but could not be fulfilled.
    InternalError,
}

impl ReplyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Malformed => "MALFORMED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply payload pairing the original request with its outcome.
///
/// Exactly one of `response` and `error_message` is populated; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "Req: Deserialize<'de>, Resp: Deserialize<'de>"))]
pub struct ResponseEnvelope<Req, Resp> {
    request: Option<Req>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<Resp>,
    status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl<Req, Resp> ResponseEnvelope<Req, Resp> {
    /// A successful reply carrying the service response.
    #[must_use]
    pub fn success(request: Option<Req>, response: Resp) -> Self {
        Self {
            request,
            response: Some(response),
            status: ReplyStatus::Success,
            error_message: None,
        }
    }

    /// A reply rejecting a structurally incomplete message.
    #[must_use]
    pub fn malformed(request: Option<Req>, reason: impl Into<String>) -> Self {
        Self::error(request, ReplyStatus::Malformed, reason.into())
    }

    /// A reply reporting a failure to fulfill a well-formed request.
    #[must_use]
    pub fn internal_error(request: Option<Req>, message: impl Into<String>) -> Self {
        Self::error(request, ReplyStatus::InternalError, message.into())
    }

    fn error(request: Option<Req>, status: ReplyStatus, message: String) -> Self {
        Self {
            request,
            response: None,
            status,
            error_message: Some(message),
        }
    }

    /// Replace the outcome with an internal error, keeping the request.
    #[must_use]
    pub fn into_internal_error(self, message: impl Into<String>) -> Self {
        Self::internal_error(self.request, message)
    }

    pub fn request(&self) -> Option<&Req> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&Resp> {
        self.response.as_ref()
    }

    pub fn status(&self) -> ReplyStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Inbound commit request message.
pub type CommitEnvelope = TraceableEnvelope<CommitRequest>;

/// Outbound commit reply message.
pub type CommitReply = TraceableEnvelope<ResponseEnvelope<CommitRequest, CommitResponse>>;

impl CommitReply {
    /// Status of the wrapped reply, if present.
    pub fn status(&self) -> Option<ReplyStatus> {
        self.payload.as_ref().map(ResponseEnvelope::status)
    }

    /// Partition key for the reply: the request's account number.
    pub fn account_number(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(ResponseEnvelope::request)
            .and_then(|request| request.account_number.as_deref())
    }
}
