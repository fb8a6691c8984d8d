//! The commit fulfillment pipeline.
//!
//! A [`FulfillmentController`] validates each inbound envelope, invokes the
//! commit operation, composes a reply and publishes it, then turns the
//! outcome into a [`Disposition`](fulfillment_bus::Disposition) for the
//! record's acknowledgment handle.

pub mod builder;
pub mod composer;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod validator;

pub use builder::{DEFAULT_REDELIVERY_DELAY, FulfillmentControllerBuilder};
pub use composer::{Clock, ResponseComposer};
pub use controller::{FulfillmentController, Stage};
pub use error::{GatewayError, Malformed};
pub use metrics::{FulfillmentMetrics, MetricsSnapshot};
pub use validator::EnvelopeValidator;
