//! HTTP transport for outbound deliveries
//!
//! The [`Transport`] trait is the seam between the delivery pipeline and the
//! network. [`HttpTransport`] is the reqwest-backed implementation; it owns
//! timeouts and the retry loop so the pipeline only states how many retries a
//! request may use.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// One JSON POST to be issued
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    /// Extra headers beyond the JSON content type
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
    /// Automatic retries allowed after the first attempt
    pub max_retries: usize,
}

/// Final HTTP answer for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues outbound JSON requests.
///
/// Implementations retry transient failures up to `request.max_retries` times.
/// They return `Ok` with the last response whenever the server answered, and
/// [`Error::Delivery`] with no status when it never did.
pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        request: &OutboundRequest,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http_client: reqwest::Client,
    retry_delay: Duration,
}

impl HttpTransport {
    /// Create a new transport from configuration
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Single attempt, no retries
    async fn send_once(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let response = self
            .http_client
            .post(&request.url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| Error::Delivery {
                status: None,
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(TransportResponse { status, body })
    }
}

impl Transport for HttpTransport {
    /// Retries network errors and 5xx responses with exponential backoff.
    async fn post_json(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        let mut last_outcome = None;
        let mut delay = self.retry_delay;

        for attempt in 0..=request.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying delivery (attempt {}/{}), waiting {:?}",
                    attempt + 1,
                    request.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.send_once(request).await {
                Ok(response) if is_retryable_status(response.status) => {
                    tracing::warn!(status = response.status, "Transient error response");
                    last_outcome = Some(Ok(response));
                }
                Ok(response) => return Ok(response),
                Err(e) if is_retryable_error(&e) => {
                    tracing::warn!("Transient error delivering event: {}", e);
                    last_outcome = Some(Err(e));
                }
                Err(e) => return Err(e),
            }
        }

        last_outcome.unwrap_or_else(|| {
            Err(Error::Delivery {
                status: None,
                message: "max retries exceeded".to_string(),
            })
        })
    }
}

/// 5xx responses are worth another attempt
fn is_retryable_status(status: u16) -> bool {
    (500..600).contains(&status)
}

/// Network failures (no response at all) are worth another attempt
fn is_retryable_error(error: &Error) -> bool {
    matches!(error, Error::Delivery { status: None, .. })
}
