use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to commit a previously reserved transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// Idempotency key of this commit request.
    pub request_uuid: Option<Uuid>,

    /// The reservation being committed.
    pub reservation_uuid: Option<Uuid>,

    /// Account the reservation belongs to. Also the reply partition key.
    pub account_number: Option<String>,

    /// Opaque transaction metadata, forwarded to the commit service as-is.
    pub transaction_metadata: Option<String>,
}

impl CommitRequest {
    /// Create a fully populated request.
    #[must_use]
    pub fn new(
        request_uuid: Uuid,
        reservation_uuid: Uuid,
        account_number: impl Into<String>,
        transaction_metadata: impl Into<String>,
    ) -> Self {
        Self {
            request_uuid: Some(request_uuid),
            reservation_uuid: Some(reservation_uuid),
            account_number: Some(account_number.into()),
            transaction_metadata: Some(transaction_metadata.into()),
        }
    }
}

/// Outcome reported by the commit service.
///
/// Unknown values are kept verbatim in [`CommitStatus::Other`] so that the
/// rejection can be reported back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommitStatus {
    /// The reservation was committed by this call.
    Success,
    /// The reservation had already been committed by an earlier call.
    AlreadyPresent,
    /// Any other status.
    Other(String),
}

impl CommitStatus {
    /// Returns `true` for the statuses that terminate a commit successfully.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyPresent)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::AlreadyPresent => "ALREADY_PRESENT",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for CommitStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SUCCESS" => Self::Success,
            "ALREADY_PRESENT" => Self::AlreadyPresent,
            _ => Self::Other(raw),
        }
    }
}

impl From<CommitStatus> for String {
    fn from(status: CommitStatus) -> Self {
        match status {
            CommitStatus::Other(raw) => raw,
            accepted => accepted.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by the commit service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub status: CommitStatus,

    /// Snapshot of the committed transaction resource. Opaque to this stage.
    #[serde(rename = "resource", default)]
    pub resource_snapshot: serde_json::Value,
}

impl CommitResponse {
    #[must_use]
    pub fn new(status: CommitStatus, resource_snapshot: serde_json::Value) -> Self {
        Self {
            status,
            resource_snapshot,
        }
    }
}

/// Service response wrapper carrying the server-side elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedResponse<T> {
    #[serde(default)]
    pub elapsed_ms: u64,
    pub payload: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&CommitStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&CommitStatus::AlreadyPresent).unwrap(),
            "\"ALREADY_PRESENT\""
        );

        let other: CommitStatus = serde_json::from_str("\"INSUFFICIENT_FUNDS\"").unwrap();
        assert_eq!(other, CommitStatus::Other("INSUFFICIENT_FUNDS".into()));
        assert!(!other.is_accepted());
        assert_eq!(other.to_string(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn accepted_statuses() {
        assert!(CommitStatus::Success.is_accepted());
        assert!(CommitStatus::AlreadyPresent.is_accepted());
        assert!(!CommitStatus::Other("FAILURE".into()).is_accepted());
    }

    #[test]
    fn timed_response_decodes_service_body() {
        let body = r#"{"elapsedMs":12,"payload":{"status":"ALREADY_PRESENT","resource":{"id":"t-1"}}}"#;
        let timed: TimedResponse<CommitResponse> = serde_json::from_str(body).unwrap();
        assert_eq!(timed.elapsed_ms, 12);
        assert_eq!(timed.payload.status, CommitStatus::AlreadyPresent);
        assert_eq!(timed.payload.resource_snapshot["id"], "t-1");
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = CommitRequest::new(Uuid::new_v4(), Uuid::new_v4(), "12345", "{}");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("requestUuid").is_some());
        assert!(json.get("reservationUuid").is_some());
        assert_eq!(json["accountNumber"], "12345");
        assert_eq!(json["transactionMetadata"], "{}");
    }
}
