use crate::types::{ForwardRequest, ForwardResponse, Result};
use async_trait::async_trait;

/// Outbound HTTP client used by the forwarder.
///
/// Implementations must report connection-level failures as
/// `ProxyError::BackendUnreachable` and keep every other failure distinct.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(&self, url: &str, request: ForwardRequest) -> Result<ForwardResponse>;
}
