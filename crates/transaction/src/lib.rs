//! Client side of the external transaction service.
//!
//! [`CommitInvoker`] runs a [`CommitTransport`] under a retry policy and
//! classifies the result as success, [`InvokeError::Transient`] or
//! [`InvokeError::NonTransient`]. [`HttpCommitTransport`] is the production
//! transport.

pub mod error;
pub mod http;
pub mod invoker;
pub mod transport;

pub use error::{InvokeError, TransportError};
pub use http::{HttpCommitTransport, HttpTransportConfig};
pub use invoker::{CommitInvoker, Invoke};
pub use transport::{
    AIT_ID_HEADER, BUSINESS_TAXONOMY_ID_HEADER, CORRELATION_ID_HEADER, CommitCallResponse,
    CommitHeaders, CommitTransport,
};
