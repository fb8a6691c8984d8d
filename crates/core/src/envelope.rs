use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trace-carrying wrapper around a domain payload.
///
/// Every field is optional on the wire so that an incomplete message still
/// decodes and can be rejected by validation with a precise reason, rather
/// than being dropped by the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceableEnvelope<T> {
    /// AIT identifier of the producing application.
    pub producer_ait_id: Option<String>,

    /// Correlation identifier shared by every message of one business flow.
    pub correlation_id: Option<String>,

    /// Business taxonomy identifier used for routing and reporting.
    pub business_taxonomy_id: Option<String>,

    /// When the upstream producer created the message.
    pub creation_time: Option<DateTime<Utc>>,

    /// When this stage produced a terminal response. Only ever set on
    /// outbound envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,

    /// The wrapped domain payload.
    pub payload: Option<T>,
}

impl<T> TraceableEnvelope<T> {
    /// Create a complete envelope stamped with the current time.
    #[must_use]
    pub fn new(
        producer_ait_id: impl Into<String>,
        correlation_id: impl Into<String>,
        business_taxonomy_id: impl Into<String>,
        payload: T,
    ) -> Self {
        Self {
            producer_ait_id: Some(producer_ait_id.into()),
            correlation_id: Some(correlation_id.into()),
            business_taxonomy_id: Some(business_taxonomy_id.into()),
            creation_time: Some(Utc::now()),
            completion_time: None,
            payload: Some(payload),
        }
    }

    /// Consume the envelope and build a derived one around a new payload.
    ///
    /// The producer AIT, correlation id, business taxonomy id and creation
    /// time are carried over unchanged. The completion time is cleared; the
    /// caller decides whether the derived envelope is terminal.
    #[must_use]
    pub fn map_payload<U>(self, f: impl FnOnce(Option<T>) -> U) -> TraceableEnvelope<U> {
        TraceableEnvelope {
            producer_ait_id: self.producer_ait_id,
            correlation_id: self.correlation_id,
            business_taxonomy_id: self.business_taxonomy_id,
            creation_time: self.creation_time,
            completion_time: None,
            payload: Some(f(self.payload)),
        }
    }

    /// Whether the trace fields of `other` match this envelope's.
    pub fn same_trace<U>(&self, other: &TraceableEnvelope<U>) -> bool {
        self.producer_ait_id == other.producer_ait_id
            && self.correlation_id == other.correlation_id
            && self.business_taxonomy_id == other.business_taxonomy_id
            && self.creation_time == other.creation_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_populates_trace_fields() {
        let envelope = TraceableEnvelope::new("27834", "corr-1", "tax-1", 42_u32);
        assert_eq!(envelope.producer_ait_id.as_deref(), Some("27834"));
        assert_eq!(envelope.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(envelope.business_taxonomy_id.as_deref(), Some("tax-1"));
        assert!(envelope.creation_time.is_some());
        assert!(envelope.completion_time.is_none());
        assert_eq!(envelope.payload, Some(42));
    }

    #[test]
    fn map_payload_preserves_trace_and_clears_completion() {
        let mut envelope = TraceableEnvelope::new("27834", "corr-1", "tax-1", 7_u32);
        envelope.completion_time = Some(Utc::now());

        let derived = envelope.clone().map_payload(|p| p.map(|v| v * 2));
        assert!(envelope.same_trace(&derived));
        assert!(derived.completion_time.is_none());
        assert_eq!(derived.payload, Some(Some(14)));
    }

    #[test]
    fn missing_fields_decode_as_none() {
        let json = r#"{"correlationId":"c-1","payload":5}"#;
        let envelope: TraceableEnvelope<u32> = serde_json::from_str(json).unwrap();
        assert!(envelope.producer_ait_id.is_none());
        assert_eq!(envelope.correlation_id.as_deref(), Some("c-1"));
        assert!(envelope.creation_time.is_none());
        assert_eq!(envelope.payload, Some(5));
    }

    #[test]
    fn camel_case_wire_names() {
        let envelope = TraceableEnvelope::new("a", "b", "c", "p".to_owned());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["producerAitId"], "a");
        assert_eq!(json["correlationId"], "b");
        assert_eq!(json["businessTaxonomyId"], "c");
        assert!(json.get("creationTime").is_some());
        assert!(
            json.get("completionTime").is_none(),
            "unset completion time is omitted"
        );
    }
}
