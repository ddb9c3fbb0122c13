use crate::backends::UpstreamTransport;
use crate::logging::RequestLogger;
use crate::pool::ServerPool;
use crate::types::{ForwardRequest, ForwardResponse, ProxyError, Result};
use std::sync::Arc;

/// Sends each request to one randomly picked pool member.
///
/// A single pick-and-send is final: failures are classified, never retried.
pub struct Forwarder {
    pool: Arc<ServerPool>,
    transport: Arc<dyn UpstreamTransport>,
}

impl Forwarder {
    pub fn new(pool: Arc<ServerPool>, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self { pool, transport }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    pub async fn forward(
        &self,
        request: ForwardRequest,
        logger: &RequestLogger,
    ) -> Result<ForwardResponse> {
        // `pick` hands back an owned id; the pool lock is already released.
        let backend = self.pool.pick().map_err(|e| {
            tracing::error!(error = %e, "No backend available for request");
            e
        })?;

        let url = request.target_url(&backend);
        logger.log_upstream_request(
            &backend,
            &url,
            &request.headers,
            std::str::from_utf8(&request.body).ok(),
        );

        match self.transport.send(&url, request).await {
            Ok(response) => {
                logger.log_upstream_response(
                    &backend,
                    Some(response.status.as_u16()),
                    Some(&response.headers),
                    None,
                );
                Ok(response)
            }
            Err(err) => {
                logger.log_upstream_response(&backend, None, None, Some(&err.to_string()));
                if !matches!(err, ProxyError::BackendUnreachable(_)) {
                    tracing::error!(
                        backend = %backend,
                        error = %err,
                        "Unclassified upstream failure"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, LoggingConfig};
    use crate::proxy::ProxyClient;
    use async_trait::async_trait;
    use axum::response::IntoResponse;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method, StatusCode};
    use std::sync::Mutex;

    /// Records every outbound call and answers with a canned result.
    struct FakeTransport {
        calls: Mutex<Vec<(String, ForwardRequest)>>,
        reply: fn() -> Result<ForwardResponse>,
    }

    impl FakeTransport {
        fn new(reply: fn() -> Result<ForwardResponse>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<(String, ForwardRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpstreamTransport for FakeTransport {
        async fn send(&self, url: &str, request: ForwardRequest) -> Result<ForwardResponse> {
            self.calls.lock().unwrap().push((url.to_string(), request));
            (self.reply)()
        }
    }

    fn ok_reply() -> Result<ForwardResponse> {
        Ok(ForwardResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"done"),
        })
    }

    fn unreachable_reply() -> Result<ForwardResponse> {
        Err(ProxyError::BackendUnreachable(
            "connection refused (http://10.1.2.3:5000)".to_string(),
        ))
    }

    fn internal_reply() -> Result<ForwardResponse> {
        Err(ProxyError::Internal("unexpected client state".to_string()))
    }

    fn logger() -> RequestLogger {
        RequestLogger::new(LoggingConfig::default())
    }

    fn pool_of(ids: &[&str]) -> Arc<ServerPool> {
        let pool = ServerPool::new();
        for id in ids {
            pool.add(*id).unwrap();
        }
        Arc::new(pool)
    }

    fn post(path: &str, body: &'static [u8]) -> ForwardRequest {
        let mut request = ForwardRequest::new(Method::POST, path);
        request.body = Bytes::from_static(body);
        request
    }

    fn unused_local_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_forward_targets_picked_backend() {
        let transport = FakeTransport::new(ok_reply);
        let forwarder = Forwarder::new(pool_of(&["http://a:5000"]), transport.clone());

        let mut request = post("/jobs/42", b"payload");
        request
            .headers
            .insert("x-request-id", HeaderValue::from_static("r-1"));
        let response = forwarder.forward(request, &logger()).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (url, sent) = &calls[0];
        assert_eq!(url, "http://a:5000/jobs/42");
        assert_eq!(sent.method, Method::POST);
        assert_eq!(&sent.body[..], b"payload");
        assert_eq!(sent.headers.get("x-request-id").unwrap(), "r-1");
        assert_eq!(sent.headers.len(), 1);
    }

    #[tokio::test]
    async fn test_forward_only_targets_members() {
        let transport = FakeTransport::new(ok_reply);
        let forwarder = Forwarder::new(
            pool_of(&["http://a:5000", "http://b:5001"]),
            transport.clone(),
        );

        for _ in 0..50 {
            forwarder.forward(post("/x", b""), &logger()).await.unwrap();
        }

        for (url, _) in transport.calls() {
            assert!(url == "http://a:5000/x" || url == "http://b:5001/x", "{}", url);
        }
    }

    #[tokio::test]
    async fn test_forward_empty_pool_is_internal_error() {
        let transport = FakeTransport::new(ok_reply);
        let forwarder = Forwarder::new(Arc::new(ServerPool::new()), transport.clone());

        let result = forwarder.forward(post("/jobs", b""), &logger()).await;

        assert!(matches!(result, Err(ProxyError::PoolEmpty)));
        assert!(transport.calls().is_empty());
        assert_eq!(
            result.unwrap_err().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_forward_passes_unreachable_through() {
        let forwarder = Forwarder::new(
            pool_of(&["http://10.1.2.3:5000"]),
            FakeTransport::new(unreachable_reply),
        );

        let result = forwarder.forward(post("/jobs", b""), &logger()).await;
        assert!(matches!(result, Err(ProxyError::BackendUnreachable(_))));
    }

    #[tokio::test]
    async fn test_forward_keeps_other_failures_distinct() {
        let forwarder = Forwarder::new(
            pool_of(&["http://a:5000"]),
            FakeTransport::new(internal_reply),
        );

        let result = forwarder.forward(post("/jobs", b""), &logger()).await;
        match result {
            Err(err @ ProxyError::Internal(_)) => {
                assert_ne!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("Expected Internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forward_to_down_backend_is_service_unavailable() {
        let backend = unused_local_url();
        let client = Arc::new(ProxyClient::new(&ClientConfig::default()).unwrap());
        let forwarder = Forwarder::new(pool_of(&[backend.as_str()]), client);

        let err = forwarder
            .forward(post("/jobs", b"payload"), &logger())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::BackendUnreachable(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        let host_port = backend.trim_start_matches("http://");
        assert!(!body.contains(host_port), "body leaked backend: {}", body);
        assert!(!body.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_forward_to_live_backend_is_byte_identical() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/submit")
            .match_body("job")
            .with_status(201)
            .with_body("ok")
            .create_async()
            .await;

        let client = Arc::new(ProxyClient::new(&ClientConfig::default()).unwrap());
        let forwarder = Forwarder::new(pool_of(&[server.url().as_str()]), client);

        let response = forwarder
            .forward(post("/submit", b"job"), &logger())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(&response.body[..], b"ok");
    }
}
