use std::sync::Arc;
use std::time::Duration;

use fulfillment_bus::ReplyPublisher;
use fulfillment_transaction::Invoke;

use crate::composer::ResponseComposer;
use crate::controller::FulfillmentController;
use crate::error::GatewayError;
use crate::metrics::FulfillmentMetrics;
use crate::validator::EnvelopeValidator;

/// Delay before a nacked record is delivered again.
pub const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_secs(10);

/// Builder for constructing a [`FulfillmentController`].
pub struct FulfillmentControllerBuilder {
    invoker: Option<Arc<dyn Invoke>>,
    publisher: Option<Arc<dyn ReplyPublisher>>,
    composer: ResponseComposer,
    redelivery_delay: Duration,
    metrics: Option<Arc<FulfillmentMetrics>>,
}

impl FulfillmentControllerBuilder {
    pub fn new() -> Self {
        Self {
            invoker: None,
            publisher: None,
            composer: ResponseComposer::new(),
            redelivery_delay: DEFAULT_REDELIVERY_DELAY,
            metrics: None,
        }
    }

    /// Set the commit invoker (required).
    #[must_use]
    pub fn invoker(mut self, invoker: Arc<dyn Invoke>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Set the reply publisher (required).
    #[must_use]
    pub fn publisher(mut self, publisher: Arc<dyn ReplyPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn composer(mut self, composer: ResponseComposer) -> Self {
        self.composer = composer;
        self
    }

    #[must_use]
    pub fn redelivery_delay(mut self, delay: Duration) -> Self {
        self.redelivery_delay = delay;
        self
    }

    /// Share an existing metrics registry instead of creating one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<FulfillmentMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Consume the builder and produce a configured [`FulfillmentController`].
    ///
    /// Returns a [`GatewayError::Configuration`] if the invoker or the
    /// publisher has not been set.
    pub fn build(self) -> Result<FulfillmentController, GatewayError> {
        let invoker = self
            .invoker
            .ok_or_else(|| GatewayError::Configuration("commit invoker is required".into()))?;

        let publisher = self
            .publisher
            .ok_or_else(|| GatewayError::Configuration("reply publisher is required".into()))?;

        Ok(FulfillmentController {
            validator: EnvelopeValidator::new(),
            invoker,
            composer: self.composer,
            publisher,
            redelivery_delay: self.redelivery_delay,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for FulfillmentControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
