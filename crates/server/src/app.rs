//! Wiring of the pipeline from configuration.

use std::sync::Arc;

use fulfillment_bus::{
    Codec, CommitListener, JsonCodec, KafkaReplyPublisher, MessageHandler, subscribe_consumer,
};
use fulfillment_core::{CommitEnvelope, CommitReply};
use fulfillment_executor::RetryPolicy;
use fulfillment_gateway::{FulfillmentController, FulfillmentControllerBuilder};
use fulfillment_transaction::{CommitInvoker, HttpCommitTransport};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info, info_span};

use crate::config::FulfillmentConfig;
use crate::error::ServerError;

/// Build the controller with the HTTP commit transport and the Kafka reply
/// publisher.
pub fn build_controller(config: &FulfillmentConfig) -> Result<FulfillmentController, ServerError> {
    let transport = HttpCommitTransport::new(&config.commit.transport_config())?;
    let invoker = CommitInvoker::new(
        Arc::new(transport),
        RetryPolicy::new(config.commit.retry_config()),
        config.source_id.clone(),
        config.commit.url.clone(),
    );

    let reply_codec: Arc<dyn Codec<CommitReply>> = Arc::new(JsonCodec::new());
    let publisher = KafkaReplyPublisher::from_properties(
        &config.kafka.producer,
        reply_codec,
        config.kafka.reply_topic.clone(),
        config.kafka.delivery_timeout(),
    )?;

    let controller = FulfillmentControllerBuilder::new()
        .invoker(Arc::new(invoker))
        .publisher(Arc::new(publisher))
        .redelivery_delay(config.kafka.redelivery_delay())
        .build()?;
    Ok(controller)
}

/// Spawn `kafka.workers` listeners onto `tracker`, each with its own consumer
/// in the configured group.
///
/// A listener that stops on its own cancels `cancel`, taking the others
/// down with it so the process can exit and be restarted.
pub fn spawn_listeners(
    config: &FulfillmentConfig,
    controller: &Arc<FulfillmentController>,
    tracker: &TaskTracker,
    cancel: &CancellationToken,
) -> Result<(), ServerError> {
    let codec: Arc<dyn Codec<CommitEnvelope>> = Arc::new(JsonCodec::new());
    let handler: Arc<dyn MessageHandler<CommitEnvelope>> = Arc::clone(controller) as _;

    for worker in 0..config.kafka.workers {
        let consumer = subscribe_consumer(&config.kafka.consumer, &config.kafka.request_topic)?;
        let listener = CommitListener::new(
            consumer,
            Arc::clone(&codec),
            Arc::clone(&handler),
            cancel.clone(),
        );
        let shutdown = cancel.clone();
        let task = async move {
            if let Err(e) = listener.run().await {
                error!(error = %e, "listener stopped, shutting down");
                shutdown.cancel();
            }
        };
        tracker.spawn(task.instrument(info_span!("listener", worker)));
    }

    info!(
        workers = config.kafka.workers,
        topic = %config.kafka.request_topic,
        "listeners started"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_controller_from_defaults() {
        let config = FulfillmentConfig::default();
        let controller = build_controller(&config).expect("default config should wire");
        assert_eq!(
            controller.redelivery_delay(),
            config.kafka.redelivery_delay()
        );
        assert_eq!(controller.metrics().snapshot().received, 0);
    }

    #[test]
    fn unknown_producer_property_is_a_kafka_error() {
        let mut config = FulfillmentConfig::default();
        config
            .kafka
            .producer
            .insert("no.such.property".into(), "1".into());
        let err = build_controller(&config).expect_err("producer creation must fail");
        assert!(matches!(err, ServerError::Kafka(_)), "got {err}");
    }
}
