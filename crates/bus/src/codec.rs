use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure to turn bytes into a message or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Encode/decode capability for one message type on the wire.
pub trait Codec<T>: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;
}

/// JSON codec over any serde type.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use fulfillment_core::{CommitEnvelope, CommitRequest};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn decodes_partial_envelope() {
        let codec = JsonCodec::<CommitEnvelope>::new();
        let envelope = codec
            .decode(br#"{"correlationId":"c-1","payload":{"accountNumber":"42"}}"#)
            .unwrap();
        assert_eq!(envelope.correlation_id.as_deref(), Some("c-1"));
        assert!(envelope.producer_ait_id.is_none());
        let payload = envelope.payload.unwrap();
        assert_eq!(payload.account_number.as_deref(), Some("42"));
        assert!(payload.request_uuid.is_none());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let codec = JsonCodec::<CommitEnvelope>::new();
        let err = codec.decode(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn encodes_camel_case() {
        let codec = JsonCodec::<CommitEnvelope>::new();
        let envelope = CommitEnvelope::new(
            "p",
            "c",
            "t",
            CommitRequest::new(Uuid::nil(), Uuid::nil(), "9", "{}"),
        );
        let text = String::from_utf8(codec.encode(&envelope).unwrap()).unwrap();
        assert!(text.contains(r#""producerAitId":"p""#));
        assert!(text.contains(r#""transactionMetadata":"{}""#));
        assert!(!text.contains("completionTime"));
    }
}
