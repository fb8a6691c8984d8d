//! Message transport for the fulfillment pipeline.
//!
//! The pipeline only sees three narrow seams: [`Codec`] for bytes on the
//! wire, [`Acknowledgment`] for resolving a consumed record and
//! [`ReplyPublisher`] for confirmed reply writes. The Kafka implementations
//! of those seams ([`CommitListener`], [`KafkaAcknowledgment`],
//! [`KafkaReplyPublisher`]) live alongside.

pub mod ack;
pub mod codec;
pub mod kafka;
pub mod listener;
pub mod publisher;

pub use ack::{AckError, Acknowledgment, Disposition};
pub use codec::{Codec, CodecError, JsonCodec};
pub use kafka::{
    KafkaReplyPublisher, MESSAGE_TIMEOUT_PROPERTY, client_config, producer_config,
    subscribe_consumer,
};
pub use listener::{CommitListener, KafkaAcknowledgment, MessageHandler, RecordPosition};
pub use publisher::{PublishError, ReplyPublisher};
