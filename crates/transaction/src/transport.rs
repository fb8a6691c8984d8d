use async_trait::async_trait;
use fulfillment_core::{CommitEnvelope, CommitRequest, CommitResponse, TimedResponse};

use crate::error::TransportError;

/// Header carrying the calling application's AIT identifier.
pub const AIT_ID_HEADER: &str = "AIT-ID";
/// Header carrying the business taxonomy identifier of the flow.
pub const BUSINESS_TAXONOMY_ID_HEADER: &str = "Business-Taxonomy-ID";
/// Header carrying the correlation identifier of the flow.
pub const CORRELATION_ID_HEADER: &str = "Correlation-ID";

/// Trace headers sent with every commit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHeaders {
    /// Identifier of this service, not of the upstream producer.
    pub ait_id: String,
    pub business_taxonomy_id: Option<String>,
    pub correlation_id: Option<String>,
}

impl CommitHeaders {
    pub fn from_envelope(source_id: &str, envelope: &CommitEnvelope) -> Self {
        Self {
            ait_id: source_id.to_owned(),
            business_taxonomy_id: envelope.business_taxonomy_id.clone(),
            correlation_id: envelope.correlation_id.clone(),
        }
    }

    /// Header name/value pairs, skipping absent values.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (AIT_ID_HEADER, Some(self.ait_id.as_str())),
            (
                BUSINESS_TAXONOMY_ID_HEADER,
                self.business_taxonomy_id.as_deref(),
            ),
            (CORRELATION_ID_HEADER, self.correlation_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// What came back from one commit call that reached the service.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitCallResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body; `None` when the body was empty or not a commit response.
    pub body: Option<TimedResponse<CommitResponse>>,
}

impl CommitCallResponse {
    pub const CREATED: u16 = 201;

    pub fn is_created(&self) -> bool {
        self.status == Self::CREATED
    }
}

/// Transport issuing a single commit call. Implementations must be safe for
/// concurrent use by independent workers.
#[async_trait]
pub trait CommitTransport: Send + Sync {
    /// POST `request` to `url`. Returns `Err` only when the call did not
    /// produce an HTTP response.
    async fn post_commit(
        &self,
        url: &str,
        headers: &CommitHeaders,
        request: &CommitRequest,
    ) -> Result<CommitCallResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_from_envelope() {
        let envelope = CommitEnvelope::new(
            "producer-ait",
            "corr-9",
            "tax-9",
            CommitRequest::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), "1", "{}"),
        );
        let headers = CommitHeaders::from_envelope("27834", &envelope);
        assert_eq!(headers.ait_id, "27834", "source id, not producer AIT");

        let pairs: Vec<_> = headers.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (AIT_ID_HEADER, "27834"),
                (BUSINESS_TAXONOMY_ID_HEADER, "tax-9"),
                (CORRELATION_ID_HEADER, "corr-9"),
            ]
        );
    }

    #[test]
    fn absent_values_are_skipped() {
        let headers = CommitHeaders {
            ait_id: "1".into(),
            business_taxonomy_id: None,
            correlation_id: Some("c".into()),
        };
        assert_eq!(headers.pairs().count(), 2);
    }
}
