use std::time::Duration;

use async_trait::async_trait;
use fulfillment_core::{CommitRequest, CommitResponse, TimedResponse};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::error::TransportError;
use crate::transport::{CommitCallResponse, CommitHeaders, CommitTransport};

/// Timeouts for the HTTP commit transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Time allowed to establish a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Time allowed for a whole request, from send to fully read body.
    pub request_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(1),
        }
    }
}

/// [`CommitTransport`] backed by a pooled `reqwest` client.
pub struct HttpCommitTransport {
    client: Client,
}

impl HttpCommitTransport {
    pub fn new(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use an existing client, e.g. to share a connection pool.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommitTransport for HttpCommitTransport {
    #[instrument(skip(self, headers, request), fields(correlation_id = headers.correlation_id.as_deref()))]
    async fn post_commit(
        &self,
        url: &str,
        headers: &CommitHeaders,
        request: &CommitRequest,
    ) -> Result<CommitCallResponse, TransportError> {
        let mut builder = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request);
        for (name, value) in headers.pairs() {
            builder = builder.header(name, value);
        }

        debug!(url, "posting commit");
        let response = builder.send().await.map_err(|e| {
            let err = TransportError::from(e);
            warn!(error = %err, "commit call did not complete");
            err
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(TransportError::from)?;
        let body = if text.is_empty() {
            None
        } else {
            match serde_json::from_str::<TimedResponse<CommitResponse>>(&text) {
                Ok(body) => Some(body),
                Err(e) => {
                    debug!(status, error = %e, "commit response body is not a commit response");
                    None
                }
            }
        };

        Ok(CommitCallResponse { status, body })
    }
}
