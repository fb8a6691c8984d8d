use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use fulfillment_bus::{
    AckError, Acknowledgment, Disposition, MessageHandler, PublishError, ReplyPublisher,
};
use fulfillment_core::{CommitEnvelope, CommitReply, ReplyStatus};
use fulfillment_transaction::{Invoke, InvokeError};
use futures::FutureExt;
use tracing::{Span, error, info, instrument, warn};

use crate::composer::ResponseComposer;
use crate::metrics::FulfillmentMetrics;
use crate::validator::EnvelopeValidator;

/// Processing stage of one record, recorded on the `stage` span field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validating,
    Invoking,
    Composing,
    Publishing,
    Acked,
    Nacked,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Invoking => "invoking",
            Self::Composing => "composing",
            Self::Publishing => "publishing",
            Self::Acked => "acked",
            Self::Nacked => "nacked",
        }
    }
}

fn enter(stage: Stage) {
    Span::current().record("stage", stage.as_str());
}

/// Orchestrates one commit request end to end and decides its
/// acknowledgment.
///
/// Every failure is resolved here. The only thing that leaves the
/// controller is a [`Disposition`]: ack once a reply has been published,
/// nack when nothing could be published.
pub struct FulfillmentController {
    pub(crate) validator: EnvelopeValidator,
    pub(crate) invoker: Arc<dyn Invoke>,
    pub(crate) composer: ResponseComposer,
    pub(crate) publisher: Arc<dyn ReplyPublisher>,
    pub(crate) redelivery_delay: Duration,
    pub(crate) metrics: Arc<FulfillmentMetrics>,
}

impl std::fmt::Debug for FulfillmentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentController").finish_non_exhaustive()
    }
}

impl FulfillmentController {
    pub fn metrics(&self) -> &Arc<FulfillmentMetrics> {
        &self.metrics
    }

    pub fn redelivery_delay(&self) -> Duration {
        self.redelivery_delay
    }

    /// Process `envelope` and resolve `ack` with the resulting decision.
    ///
    /// A panic anywhere in the pipeline nacks the record. The error from
    /// resolving the handle is returned so the caller can stop consuming
    /// when the record could not be rewound.
    pub async fn fulfill_commit(
        &self,
        envelope: CommitEnvelope,
        ack: Box<dyn Acknowledgment>,
    ) -> Result<Disposition, AckError> {
        let disposition = match AssertUnwindSafe(self.fulfill(envelope))
            .catch_unwind()
            .await
        {
            Ok(disposition) => disposition,
            Err(panic) => {
                error!(
                    error = %panic_message(panic.as_ref()),
                    "fulfillment panicked, returning record for redelivery"
                );
                self.nack()
            }
        };

        if let Err(e) = disposition.resolve(ack).await {
            error!(error = %e, %disposition, "failed to resolve acknowledgment");
            return Err(e);
        }
        Ok(disposition)
    }

    /// Process `envelope` and return the acknowledgment decision.
    #[instrument(
        name = "fulfillment.fulfill",
        skip_all,
        fields(
            correlation_id = envelope.correlation_id.as_deref(),
            stage = Stage::Received.as_str(),
        )
    )]
    pub async fn fulfill(&self, envelope: CommitEnvelope) -> Disposition {
        self.metrics.increment_received();

        enter(Stage::Validating);
        if let Err(malformed) = self.validator.validate(&envelope) {
            warn!(reason = %malformed, "malformed commit request");
            enter(Stage::Composing);
            let reply = self.composer.malformed(envelope, malformed.reason());
            return self.publish_error_reply(&reply).await;
        }

        enter(Stage::Invoking);
        let invoked = match envelope.payload.as_ref() {
            Some(request) => {
                AssertUnwindSafe(self.invoker.invoke(&envelope, request))
                    .catch_unwind()
                    .await
            }
            None => Ok(Err(InvokeError::NonTransient(
                "commit request vanished after validation".into(),
            ))),
        };

        let response = match invoked {
            Ok(Ok(response)) => response,
            Ok(Err(err @ InvokeError::Transient { .. })) => {
                warn!(
                    error = %err,
                    delay_ms = %self.redelivery_delay.as_millis(),
                    "commit service unavailable, returning record for redelivery"
                );
                self.metrics.increment_nacked_invoke();
                return self.nack();
            }
            Ok(Err(InvokeError::NonTransient(message))) => {
                error!(error = %message, "commit rejected");
                enter(Stage::Composing);
                let reply = self.composer.internal_error(envelope, message);
                return self.publish_error_reply(&reply).await;
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(error = %message, "commit invocation panicked");
                enter(Stage::Composing);
                let reply = self.composer.internal_error(envelope, message);
                return self.publish_error_reply(&reply).await;
            }
        };

        enter(Stage::Composing);
        let creation_time = envelope.creation_time;
        let reply = self.composer.success(envelope, response);

        enter(Stage::Publishing);
        match self.publisher.publish(&reply).await {
            Ok(()) => {
                self.metrics.increment_succeeded();
                if let Some(created) = creation_time {
                    let elapsed = Utc::now().signed_duration_since(created);
                    info!(
                        elapsed_ms = elapsed.num_milliseconds(),
                        "SLI fulfillment.fulfill_commit"
                    );
                }
                Self::ack(ReplyStatus::Success)
            }
            Err(PublishError::Transient(cause)) => {
                warn!(
                    error = %cause,
                    delay_ms = %self.redelivery_delay.as_millis(),
                    "reply not confirmed, returning record for redelivery"
                );
                self.metrics.increment_nacked_publish();
                self.nack()
            }
            Err(PublishError::Encode(cause)) => {
                error!(error = %cause, "success reply could not be encoded");
                enter(Stage::Composing);
                let reply = self.composer.downgrade(reply, cause);
                self.publish_error_reply(&reply).await
            }
        }
    }

    /// Publish a `MALFORMED` or `INTERNAL_ERROR` reply. Any publish failure
    /// leaves the record for redelivery.
    async fn publish_error_reply(&self, reply: &CommitReply) -> Disposition {
        enter(Stage::Publishing);
        let status = reply.status().unwrap_or(ReplyStatus::InternalError);

        if let Err(e) = self.publisher.publish(reply).await {
            error!(
                error = %e,
                %status,
                "error reply could not be published, returning record for redelivery"
            );
            self.metrics.increment_nacked_publish();
            return self.nack();
        }

        match status {
            ReplyStatus::Malformed => self.metrics.increment_malformed(),
            ReplyStatus::InternalError | ReplyStatus::Success => {
                self.metrics.increment_internal_error();
            }
        }
        Self::ack(status)
    }

    fn ack(reply: ReplyStatus) -> Disposition {
        enter(Stage::Acked);
        info!(%reply, "record fulfilled");
        Disposition::Ack { reply }
    }

    fn nack(&self) -> Disposition {
        enter(Stage::Nacked);
        Disposition::Nack {
            delay: self.redelivery_delay,
        }
    }
}

#[async_trait]
impl MessageHandler<CommitEnvelope> for FulfillmentController {
    async fn handle(
        &self,
        message: CommitEnvelope,
        ack: Box<dyn Acknowledgment>,
    ) -> Result<(), AckError> {
        self.fulfill_commit(message, ack).await.map(|_| ())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_owned()
    }
}
