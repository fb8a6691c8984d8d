use fulfillment_core::{CommitEnvelope, CommitRequest};

use crate::error::Malformed;

pub const MISSING_PRODUCER_AIT_ID: &str = "Malformed message. Missing Producer AIT Id.";
pub const MISSING_CORRELATION_ID: &str = "Malformed message. Missing Correlation Id.";
pub const MISSING_BUSINESS_TAXONOMY_ID: &str = "Malformed message. Missing Business Taxonomy Id.";
pub const MISSING_CREATION_TIME: &str = "Malformed message. Missing Message Creation Time.";
pub const MISSING_PAYLOAD: &str = "Malformed message. Missing Fulfillment Message.";
pub const MISSING_REQUEST_UUID: &str = "Malformed message payload. Missing Request UUID.";
pub const MISSING_RESERVATION_UUID: &str = "Malformed message payload. Missing Reservation UUID.";
pub const MISSING_METADATA: &str = "Malformed message payload. Missing Meta Data.";
pub const MISSING_ACCOUNT_NUMBER: &str = "Malformed message payload. Missing Account Number.";

/// Structural completeness check for inbound commit envelopes.
///
/// Checks run in a fixed order and stop at the first missing field, so the
/// reason always names exactly one field.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeValidator;

impl EnvelopeValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, envelope: &CommitEnvelope) -> Result<(), Malformed> {
        require(envelope.producer_ait_id.is_some(), MISSING_PRODUCER_AIT_ID)?;
        require(envelope.correlation_id.is_some(), MISSING_CORRELATION_ID)?;
        require(
            envelope.business_taxonomy_id.is_some(),
            MISSING_BUSINESS_TAXONOMY_ID,
        )?;
        require(envelope.creation_time.is_some(), MISSING_CREATION_TIME)?;
        let request = envelope
            .payload
            .as_ref()
            .ok_or(Malformed::new(MISSING_PAYLOAD))?;
        Self::validate_request(request)
    }

    fn validate_request(request: &CommitRequest) -> Result<(), Malformed> {
        require(request.request_uuid.is_some(), MISSING_REQUEST_UUID)?;
        require(request.reservation_uuid.is_some(), MISSING_RESERVATION_UUID)?;
        require(non_empty(request.transaction_metadata.as_deref()), MISSING_METADATA)?;
        require(non_empty(request.account_number.as_deref()), MISSING_ACCOUNT_NUMBER)
    }
}

fn require(present: bool, reason: &'static str) -> Result<(), Malformed> {
    if present {
        Ok(())
    } else {
        Err(Malformed::new(reason))
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use fulfillment_core::CommitRequest;
    use uuid::Uuid;

    use super::*;

    fn complete() -> CommitEnvelope {
        CommitEnvelope::new(
            "ait-1",
            "corr-1",
            "tax-1",
            CommitRequest::new(Uuid::new_v4(), Uuid::new_v4(), "12345", r#"{"k":"v"}"#),
        )
    }

    fn reason(envelope: &CommitEnvelope) -> &'static str {
        EnvelopeValidator::new()
            .validate(envelope)
            .unwrap_err()
            .reason()
    }

    #[test]
    fn complete_envelope_passes() {
        assert!(EnvelopeValidator::new().validate(&complete()).is_ok());
    }

    #[test]
    fn each_missing_field_is_named() {
        type Strip = fn(&mut CommitEnvelope);
        let cases: [(Strip, &str); 9] = [
            (|e| e.producer_ait_id = None, MISSING_PRODUCER_AIT_ID),
            (|e| e.correlation_id = None, MISSING_CORRELATION_ID),
            (|e| e.business_taxonomy_id = None, MISSING_BUSINESS_TAXONOMY_ID),
            (|e| e.creation_time = None, MISSING_CREATION_TIME),
            (|e| e.payload = None, MISSING_PAYLOAD),
            (
                |e| e.payload.as_mut().unwrap().request_uuid = None,
                MISSING_REQUEST_UUID,
            ),
            (
                |e| e.payload.as_mut().unwrap().reservation_uuid = None,
                MISSING_RESERVATION_UUID,
            ),
            (
                |e| e.payload.as_mut().unwrap().transaction_metadata = None,
                MISSING_METADATA,
            ),
            (
                |e| e.payload.as_mut().unwrap().account_number = None,
                MISSING_ACCOUNT_NUMBER,
            ),
        ];

        for (strip, expected) in cases {
            let mut envelope = complete();
            strip(&mut envelope);
            assert_eq!(reason(&envelope), expected);
        }
    }

    #[test]
    fn empty_metadata_is_missing() {
        let mut envelope = complete();
        envelope.payload.as_mut().unwrap().transaction_metadata = Some(String::new());
        assert_eq!(reason(&envelope), MISSING_METADATA);
    }

    #[test]
    fn first_missing_field_wins() {
        let mut envelope = complete();
        envelope.business_taxonomy_id = None;
        envelope.payload.as_mut().unwrap().reservation_uuid = None;
        assert_eq!(reason(&envelope), MISSING_BUSINESS_TAXONOMY_ID);

        let mut envelope = complete();
        envelope.payload.as_mut().unwrap().account_number = Some(String::new());
        envelope.payload.as_mut().unwrap().request_uuid = None;
        assert_eq!(reason(&envelope), MISSING_REQUEST_UUID);
    }

    #[test]
    fn reason_is_the_display() {
        let mut envelope = complete();
        envelope.correlation_id = None;
        let err = EnvelopeValidator::new().validate(&envelope).unwrap_err();
        assert_eq!(err.to_string(), "Malformed message. Missing Correlation Id.");
    }
}
