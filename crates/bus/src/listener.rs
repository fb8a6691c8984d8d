use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ack::{AckError, Acknowledgment};
use crate::codec::Codec;

/// Pause after a consumer error before polling again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// Bound on the broker round trip when rewinding a partition.
const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives decoded messages together with their acknowledgment handle.
///
/// The handler owns the handle and must resolve it before returning; the
/// listener does not poll the next record until `handle` completes. A
/// resolution failure is returned so the listener can stop before moving
/// past a record it could not rewind.
#[async_trait]
pub trait MessageHandler<T>: Send + Sync {
    async fn handle(&self, message: T, ack: Box<dyn Acknowledgment>) -> Result<(), AckError>;
}

/// Position of one consumed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPosition {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl RecordPosition {
    /// Offsets to commit once the record is processed: the next one to read.
    pub fn commit_offsets(&self) -> Result<TopicPartitionList, KafkaError> {
        let mut offsets = TopicPartitionList::new();
        offsets.add_partition_offset(&self.topic, self.partition, Offset::Offset(self.offset + 1))?;
        Ok(offsets)
    }

    /// Where to seek so the record is delivered again.
    pub fn rewind_offset(&self) -> Offset {
        Offset::Offset(self.offset)
    }
}

/// [`Acknowledgment`] for one record read by a [`StreamConsumer`].
pub struct KafkaAcknowledgment {
    consumer: Arc<StreamConsumer>,
    position: RecordPosition,
}

impl KafkaAcknowledgment {
    pub fn new(consumer: Arc<StreamConsumer>, position: RecordPosition) -> Self {
        Self { consumer, position }
    }
}

#[async_trait]
impl Acknowledgment for KafkaAcknowledgment {
    async fn ack(self: Box<Self>) -> Result<(), AckError> {
        let offsets = self
            .position
            .commit_offsets()
            .map_err(|e| AckError::Commit(e.to_string()))?;
        let RecordPosition {
            topic,
            partition,
            offset,
        } = self.position;

        // Synchronous commit blocks on the broker round trip.
        let consumer = self.consumer;
        tokio::task::spawn_blocking(move || consumer.commit(&offsets, CommitMode::Sync))
            .await
            .map_err(|e| AckError::Commit(e.to_string()))?
            .map_err(|e| AckError::Commit(e.to_string()))?;

        debug!(%topic, partition, offset, "offset committed");
        Ok(())
    }

    async fn nack(self: Box<Self>, delay: Duration) -> Result<(), AckError> {
        let rewind = self.position.rewind_offset();
        let RecordPosition {
            topic,
            partition,
            offset,
        } = self.position;

        let consumer = self.consumer;
        let seek_topic = topic.clone();
        tokio::task::spawn_blocking(move || {
            consumer.seek(&seek_topic, partition, rewind, SEEK_TIMEOUT)
        })
        .await
        .map_err(|e| AckError::Seek(e.to_string()))?
        .map_err(|e| AckError::Seek(e.to_string()))?;

        debug!(
            %topic,
            partition,
            offset,
            delay_ms = %delay.as_millis(),
            "record rewound for redelivery"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// Subscription loop over one request topic.
///
/// Each record is decoded with the codec and handed, with its
/// [`KafkaAcknowledgment`], to the handler. Records that do not decode at
/// all are acked: no reply can be correlated to them and redelivery would
/// fail the same way.
pub struct CommitListener<T> {
    consumer: Arc<StreamConsumer>,
    codec: Arc<dyn Codec<T>>,
    handler: Arc<dyn MessageHandler<T>>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> CommitListener<T> {
    pub fn new(
        consumer: Arc<StreamConsumer>,
        codec: Arc<dyn Codec<T>>,
        handler: Arc<dyn MessageHandler<T>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            consumer,
            codec,
            handler,
            cancel,
        }
    }

    /// Consume until the cancellation token fires.
    ///
    /// Cancellation is observed between records; a record already handed to
    /// the handler is resolved before the loop exits. Returns an error when a
    /// record could not be rewound for redelivery: the consumer is dropped
    /// without committing past it, so the group re-reads it from the last
    /// committed offset.
    pub async fn run(self) -> Result<(), AckError> {
        info!("commit listener started");

        loop {
            let received = tokio::select! {
                () = self.cancel.cancelled() => break,
                received = self.consumer.recv() => received,
            };

            // Copy out of the borrowed message before awaiting anything.
            let record = match received {
                Ok(message) => Some((
                    RecordPosition {
                        topic: message.topic().to_owned(),
                        partition: message.partition(),
                        offset: message.offset(),
                    },
                    message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                )),
                Err(e) => {
                    warn!(error = %e, "failed to receive record");
                    None
                }
            };
            let Some((position, payload)) = record else {
                tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                continue;
            };

            let handle = Box::new(KafkaAcknowledgment::new(
                Arc::clone(&self.consumer),
                position.clone(),
            ));
            let resolved = dispatch(
                self.codec.as_ref(),
                self.handler.as_ref(),
                &position,
                &payload,
                handle,
            )
            .await;

            match resolved {
                Ok(()) => {}
                Err(e) if e.loses_record() => {
                    error!(
                        topic = %position.topic,
                        partition = position.partition,
                        offset = position.offset,
                        error = %e,
                        "record could not be rewound, stopping listener"
                    );
                    return Err(e);
                }
                // A later commit covers this offset; at worst it is redelivered.
                Err(e) => warn!(offset = position.offset, error = %e, "record resolution failed"),
            }
        }

        info!("commit listener stopped");
        Ok(())
    }
}

/// Decode one record and hand it to `handler` with `handle`.
///
/// A record that does not decode is acked here without reaching the handler.
pub(crate) async fn dispatch<T>(
    codec: &dyn Codec<T>,
    handler: &dyn MessageHandler<T>,
    position: &RecordPosition,
    payload: &[u8],
    handle: Box<dyn Acknowledgment>,
) -> Result<(), AckError> {
    match codec.decode(payload) {
        Ok(message) => handler.handle(message, handle).await,
        Err(e) => {
            error!(
                topic = %position.topic,
                partition = position.partition,
                offset = position.offset,
                error = %e,
                "dropping undecodable record"
            );
            handle.ack().await
        }
    }
}
