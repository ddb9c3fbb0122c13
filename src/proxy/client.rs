use crate::backends::UpstreamTransport;
use crate::config::ClientConfig;
use crate::types::{ForwardRequest, ForwardResponse, ProxyError, Result};
use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder};
use std::time::Duration;

/// reqwest-backed transport shared by all forwarded requests.
pub struct ProxyClient {
    client: Client,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout_duration())
            .connect_timeout(config.connect_timeout_duration())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            // Redirects go back to the caller untouched.
            .redirect(redirect::Policy::none());

        // Disable SSL verification if configured
        if !config.ssl_verify {
            tracing::warn!("SSL verification is disabled for backend connections");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamTransport for ProxyClient {
    async fn send(&self, url: &str, request: ForwardRequest) -> Result<ForwardResponse> {
        let response = self
            .client
            .request(request.method, url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        // Headers arrived but the body did not: the connection dropped or
        // stalled mid-response.
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::BackendUnreachable(e.to_string()))?;

        Ok(ForwardResponse {
            status,
            headers,
            body,
        })
    }
}

/// Connection-level failures (refused, reset, timed out, unusable URL) mean
/// the backend could not be reached. Anything else stays an HTTP error.
fn classify_transport_error(err: reqwest::Error) -> ProxyError {
    if is_unreachable(&err) {
        ProxyError::BackendUnreachable(err.to_string())
    } else {
        ProxyError::Http(err)
    }
}

fn is_unreachable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_builder() || err.is_request() || err.is_body()
}
