use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fulfillment_core::CommitReply;
use rdkafka::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, instrument, warn};

use crate::codec::Codec;
use crate::publisher::{PublishError, ReplyPublisher};

/// Build a librdkafka client config from raw `key = value` properties.
pub fn client_config(properties: &BTreeMap<String, String>) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in properties {
        config.set(key, value);
    }
    config
}

/// librdkafka property bounding how long a produced record may wait for
/// broker confirmation, retries included.
pub const MESSAGE_TIMEOUT_PROPERTY: &str = "message.timeout.ms";

/// Producer config from raw properties. `message.timeout.ms` defaults to
/// `delivery_timeout` unless set explicitly.
pub fn producer_config(
    properties: &BTreeMap<String, String>,
    delivery_timeout: Duration,
) -> ClientConfig {
    let mut config = client_config(properties);
    if !properties.contains_key(MESSAGE_TIMEOUT_PROPERTY) {
        config.set(
            MESSAGE_TIMEOUT_PROPERTY,
            delivery_timeout.as_millis().to_string(),
        );
    }
    config
}

/// Create a consumer from raw librdkafka properties, with auto-commit forced
/// off, and subscribe it to `topic`.
pub fn subscribe_consumer(
    properties: &BTreeMap<String, String>,
    topic: &str,
) -> Result<Arc<StreamConsumer>, KafkaError> {
    let mut config = client_config(properties);
    config.set("enable.auto.commit", "false");
    let consumer: StreamConsumer = config.create()?;
    consumer.subscribe(&[topic])?;
    Ok(Arc::new(consumer))
}

/// [`ReplyPublisher`] writing to a Kafka topic.
///
/// Replies are keyed by the request's account number so every reply for one
/// account lands on the same partition. A reply without an account number
/// is sent without a key. A publish returns once the broker confirmed the
/// record or `delivery_timeout` elapsed, whichever comes first.
pub struct KafkaReplyPublisher {
    producer: FutureProducer,
    codec: Arc<dyn Codec<CommitReply>>,
    topic: String,
    delivery_timeout: Duration,
}

impl KafkaReplyPublisher {
    pub fn new(
        producer: FutureProducer,
        codec: Arc<dyn Codec<CommitReply>>,
        topic: impl Into<String>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            producer,
            codec,
            topic: topic.into(),
            delivery_timeout,
        }
    }

    /// Create the producer from raw librdkafka properties.
    pub fn from_properties(
        properties: &BTreeMap<String, String>,
        codec: Arc<dyn Codec<CommitReply>>,
        topic: impl Into<String>,
        delivery_timeout: Duration,
    ) -> Result<Self, KafkaError> {
        let producer: FutureProducer = producer_config(properties, delivery_timeout).create()?;
        Ok(Self::new(producer, codec, topic, delivery_timeout))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl ReplyPublisher for KafkaReplyPublisher {
    #[instrument(
        skip_all,
        fields(topic = %self.topic, correlation_id = reply.correlation_id.as_deref())
    )]
    async fn publish(&self, reply: &CommitReply) -> Result<(), PublishError> {
        let payload = self
            .codec
            .encode(reply)
            .map_err(|e| PublishError::Encode(e.to_string()))?;

        let record = reply_record(&self.topic, &payload, reply);

        // A full local queue fails at once instead of adding to the wait.
        let delivery = self.producer.send(record, Duration::ZERO);
        match tokio::time::timeout(self.delivery_timeout, delivery).await {
            Ok(Ok(delivery)) => {
                debug!(?delivery, "reply delivered");
                Ok(())
            }
            Ok(Err((err, _message))) => {
                warn!(error = %err, "reply delivery failed");
                Err(PublishError::Transient(err.to_string()))
            }
            Err(_) => {
                warn!(
                    timeout_ms = %self.delivery_timeout.as_millis(),
                    "reply delivery not confirmed in time"
                );
                Err(PublishError::Transient(format!(
                    "delivery not confirmed within {}ms",
                    self.delivery_timeout.as_millis()
                )))
            }
        }
    }
}

/// Record for an encoded reply, keyed by account number when there is one.
fn reply_record<'a>(
    topic: &'a str,
    payload: &'a [u8],
    reply: &'a CommitReply,
) -> FutureRecord<'a, str, [u8]> {
    let record = FutureRecord::to(topic).payload(payload);
    match reply.account_number() {
        Some(key) => record.key(key),
        None => record,
    }
}

#[cfg(test)]
mod tests {
    use fulfillment_core::{CommitEnvelope, CommitRequest, ResponseEnvelope};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn client_config_carries_raw_properties() {
        let properties = BTreeMap::from([
            ("bootstrap.servers".to_owned(), "broker:9092".to_owned()),
            ("acks".to_owned(), "all".to_owned()),
        ]);
        let config = client_config(&properties);
        assert_eq!(config.get("bootstrap.servers"), Some("broker:9092"));
        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(config.get("group.id"), None);
    }

    #[test]
    fn producer_waits_no_longer_than_the_delivery_timeout() {
        let properties = BTreeMap::from([("bootstrap.servers".to_owned(), "broker:9092".to_owned())]);
        let config = producer_config(&properties, Duration::from_millis(5000));
        assert_eq!(config.get(MESSAGE_TIMEOUT_PROPERTY), Some("5000"));
        assert_eq!(config.get("bootstrap.servers"), Some("broker:9092"));
    }

    #[test]
    fn explicit_message_timeout_wins() {
        let properties = BTreeMap::from([(MESSAGE_TIMEOUT_PROPERTY.to_owned(), "750".to_owned())]);
        let config = producer_config(&properties, Duration::from_millis(5000));
        assert_eq!(config.get(MESSAGE_TIMEOUT_PROPERTY), Some("750"));
    }

    fn reply(account_number: Option<&str>) -> CommitReply {
        let mut request = CommitRequest::new(Uuid::new_v4(), Uuid::new_v4(), "000123456", "{}");
        request.account_number = account_number.map(str::to_owned);
        CommitEnvelope::new("27834", "corr-1", "tax-1", request)
            .map_payload(|request| ResponseEnvelope::malformed(request, "reason"))
    }

    #[test]
    fn reply_is_keyed_by_account_number() {
        let reply = reply(Some("000123456"));
        let record = reply_record("commit.reply", b"{}", &reply);
        assert_eq!(record.topic, "commit.reply");
        assert_eq!(record.key, Some("000123456"));
        assert_eq!(record.payload, Some(&b"{}"[..]));
    }

    #[test]
    fn reply_without_account_number_is_unkeyed() {
        let reply = reply(None);
        let record = reply_record("commit.reply", b"{}", &reply);
        assert_eq!(record.key, None);
    }
}
