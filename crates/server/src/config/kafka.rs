use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Kafka topics, delivery behavior and raw client properties.
///
/// # Example
///
/// ```toml
/// [kafka]
/// request_topic = "commit.request"
/// reply_topic = "commit.reply"
/// redelivery_delay_ms = 10000
/// workers = 2
///
/// [kafka.consumer]
/// "bootstrap.servers" = "broker:9092"
/// "group.id" = "commit-fulfillment"
///
/// [kafka.producer]
/// "bootstrap.servers" = "broker:9092"
/// "acks" = "all"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Topic carrying inbound commit requests.
    #[serde(default = "default_request_topic")]
    pub request_topic: String,
    /// Topic receiving replies.
    #[serde(default = "default_reply_topic")]
    pub reply_topic: String,
    /// How long to wait for the broker to confirm a reply. Also the producer's
    /// `message.timeout.ms` unless `[kafka.producer]` sets it.
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    /// Delay before a nacked record is delivered again.
    #[serde(default = "default_redelivery_delay_ms")]
    pub redelivery_delay_ms: u64,
    /// Number of listener tasks, each with its own consumer.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// librdkafka consumer properties. `enable.auto.commit` is always
    /// forced off.
    #[serde(default = "default_consumer_properties")]
    pub consumer: BTreeMap<String, String>,
    /// librdkafka producer properties.
    #[serde(default = "default_producer_properties")]
    pub producer: BTreeMap<String, String>,
}

impl KafkaConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn redelivery_delay(&self) -> Duration {
        Duration::from_millis(self.redelivery_delay_ms)
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            request_topic: default_request_topic(),
            reply_topic: default_reply_topic(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
            redelivery_delay_ms: default_redelivery_delay_ms(),
            workers: default_workers(),
            consumer: default_consumer_properties(),
            producer: default_producer_properties(),
        }
    }
}

fn default_request_topic() -> String {
    "commit.request".to_owned()
}

fn default_reply_topic() -> String {
    "commit.reply".to_owned()
}

fn default_delivery_timeout_ms() -> u64 {
    5000
}

fn default_redelivery_delay_ms() -> u64 {
    10_000
}

fn default_workers() -> usize {
    1
}

fn default_consumer_properties() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("bootstrap.servers".to_owned(), "localhost:9092".to_owned()),
        ("group.id".to_owned(), "commit-fulfillment".to_owned()),
        ("auto.offset.reset".to_owned(), "earliest".to_owned()),
    ])
}

fn default_producer_properties() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("bootstrap.servers".to_owned(), "localhost:9092".to_owned()),
        ("acks".to_owned(), "all".to_owned()),
    ])
}
