use std::sync::Arc;

use async_trait::async_trait;
use fulfillment_core::{CommitEnvelope, CommitRequest, CommitResponse};
use fulfillment_executor::{RetryOutcome, RetryPolicy};
use tracing::{debug, error, info, instrument, warn};

use crate::error::InvokeError;
use crate::transport::{CommitHeaders, CommitTransport};

/// The commit operation as seen by the fulfillment pipeline.
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Commit the reservation described by `request`, tracing the call with
    /// the fields of `envelope`.
    async fn invoke(
        &self,
        envelope: &CommitEnvelope,
        request: &CommitRequest,
    ) -> Result<CommitResponse, InvokeError>;
}

/// Issues the commit operation against the transaction service and
/// classifies the outcome.
///
/// Only transport connectivity failures are retried, under the configured
/// [`RetryPolicy`]. A service answer that is not a `201` carrying an
/// accepted status is final and reported as [`InvokeError::NonTransient`].
pub struct CommitInvoker {
    transport: Arc<dyn CommitTransport>,
    policy: RetryPolicy,
    source_id: String,
    url: String,
}

impl CommitInvoker {
    pub fn new(
        transport: Arc<dyn CommitTransport>,
        policy: RetryPolicy,
        source_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            policy,
            source_id: source_id.into(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Invoke for CommitInvoker {
    #[instrument(
        name = "commit.invoke",
        skip_all,
        fields(correlation_id = envelope.correlation_id.as_deref(), url = %self.url)
    )]
    async fn invoke(
        &self,
        envelope: &CommitEnvelope,
        request: &CommitRequest,
    ) -> Result<CommitResponse, InvokeError> {
        let headers = CommitHeaders::from_envelope(&self.source_id, envelope);

        let outcome = self
            .policy
            .run(|_attempt| self.transport.post_commit(&self.url, &headers, request))
            .await;

        let (reply, attempts) = match outcome {
            RetryOutcome::Succeeded { value, attempts } => (value, attempts),
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(attempts, error = %last_error, "commit service unreachable");
                return Err(InvokeError::Transient {
                    attempts,
                    url: self.url.clone(),
                    cause: last_error.to_string(),
                });
            }
            RetryOutcome::Aborted { attempts, error } => {
                error!(attempts, error = %error, "commit call could not be issued");
                return Err(InvokeError::NonTransient(format!(
                    "POST {} failed. {error}",
                    self.url
                )));
            }
        };

        let body = match reply.body {
            Some(body) if reply.is_created() => body,
            Some(_) | None => {
                let msg = format!(
                    "Unexpected return from {} Service. HTTP {} {}.",
                    self.url,
                    reply.status,
                    if reply.body.is_some() {
                        "with body"
                    } else {
                        "without body"
                    }
                );
                error!(status = reply.status, "{msg}");
                return Err(InvokeError::NonTransient(msg));
            }
        };

        debug!(
            attempts,
            elapsed_ms = body.elapsed_ms,
            status = %body.payload.status,
            "commit service answered"
        );

        let response = body.payload;
        if !response.status.is_accepted() {
            let msg = format!(
                "Unexpected return from {} Service. Status {}.",
                self.url, response.status
            );
            error!(status = %response.status, "{msg}");
            return Err(InvokeError::NonTransient(msg));
        }

        info!(status = %response.status, "reservation committed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use fulfillment_core::{CommitStatus, TimedResponse};
    use fulfillment_executor::{RetryConfig, RetryStrategy};
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::error::TransportError;
    use crate::transport::CommitCallResponse;

    // -- Mock transport -------------------------------------------------------

    /// Replays scripted results in order and records every call.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<CommitCallResponse, TransportError>>>,
        calls: AtomicU32,
        seen_headers: Mutex<Vec<CommitHeaders>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<CommitCallResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                seen_headers: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CommitTransport for ScriptedTransport {
        async fn post_commit(
            &self,
            _url: &str,
            headers: &CommitHeaders,
            _request: &CommitRequest,
        ) -> Result<CommitCallResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_headers.lock().push(headers.clone());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".into())))
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn created(status: CommitStatus) -> Result<CommitCallResponse, TransportError> {
        Ok(CommitCallResponse {
            status: 201,
            body: Some(TimedResponse {
                elapsed_ms: 3,
                payload: CommitResponse::new(status, serde_json::json!({"id": "t-1"})),
            }),
        })
    }

    fn refused() -> Result<CommitCallResponse, TransportError> {
        Err(TransportError::Connect("connection refused".into()))
    }

    fn envelope() -> CommitEnvelope {
        CommitEnvelope::new(
            "producer",
            "corr-42",
            "tax-42",
            CommitRequest::new(Uuid::new_v4(), Uuid::new_v4(), "111", "{}"),
        )
    }

    fn invoker(transport: Arc<ScriptedTransport>) -> CommitInvoker {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 3,
            retry_strategy: RetryStrategy::Exponential {
                base: Duration::from_millis(1),
                max: Duration::from_millis(1),
                multiplier: 1.0,
                jitter: false,
            },
            attempt_timeout: None,
        });
        CommitInvoker::new(transport, policy, "27834", "http://svc/CommitReservation")
    }

    async fn invoke(transport: &Arc<ScriptedTransport>) -> Result<CommitResponse, InvokeError> {
        let envelope = envelope();
        let request = envelope.payload.clone().unwrap();
        invoker(Arc::clone(transport)).invoke(&envelope, &request).await
    }

    // -- Tests ----------------------------------------------------------------

    #[tokio::test]
    async fn success_returns_response_unchanged() {
        let transport = ScriptedTransport::new(vec![created(CommitStatus::Success)]);
        let response = invoke(&transport).await.unwrap();
        assert_eq!(response.status, CommitStatus::Success);
        assert_eq!(response.resource_snapshot["id"], "t-1");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn already_present_is_accepted() {
        let transport = ScriptedTransport::new(vec![created(CommitStatus::AlreadyPresent)]);
        let response = invoke(&transport).await.unwrap();
        assert_eq!(response.status, CommitStatus::AlreadyPresent);
    }

    #[tokio::test]
    async fn rejected_status_is_non_transient_and_not_retried() {
        let transport =
            ScriptedTransport::new(vec![created(CommitStatus::Other("FAILURE".into()))]);
        let err = invoke(&transport).await.unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("FAILURE"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn non_created_status_is_non_transient() {
        let transport = ScriptedTransport::new(vec![Ok(CommitCallResponse {
            status: 500,
            body: None,
        })]);
        let err = invoke(&transport).await.unwrap_err();
        assert!(matches!(err, InvokeError::NonTransient(_)));
        assert!(err.to_string().contains("HTTP 500"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn created_without_body_is_non_transient() {
        let transport = ScriptedTransport::new(vec![Ok(CommitCallResponse {
            status: 201,
            body: None,
        })]);
        let err = invoke(&transport).await.unwrap_err();
        assert!(matches!(err, InvokeError::NonTransient(_)));
        assert!(err.to_string().contains("without body"));
    }

    #[tokio::test]
    async fn connectivity_failures_exhaust_into_transient() {
        let transport = ScriptedTransport::new(vec![refused(), refused(), refused()]);
        let err = invoke(&transport).await.unwrap_err();
        match err {
            InvokeError::Transient { attempts, url, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(url, "http://svc/CommitReservation");
            }
            other @ InvokeError::NonTransient(_) => panic!("expected Transient, got {other:?}"),
        }
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn recovers_after_one_connectivity_failure() {
        let transport = ScriptedTransport::new(vec![refused(), created(CommitStatus::Success)]);
        assert!(invoke(&transport).await.is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn request_error_is_non_transient_without_retry() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Request("relative URL".into()))]);
        let err = invoke(&transport).await.unwrap_err();
        assert!(matches!(err, InvokeError::NonTransient(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn headers_carry_source_id_and_trace() {
        let transport = ScriptedTransport::new(vec![created(CommitStatus::Success)]);
        invoke(&transport).await.unwrap();

        let seen = transport.seen_headers.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].ait_id, "27834");
        assert_eq!(seen[0].correlation_id.as_deref(), Some("corr-42"));
        assert_eq!(seen[0].business_taxonomy_id.as_deref(), Some("tax-42"));
    }
}
