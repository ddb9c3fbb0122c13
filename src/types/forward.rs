use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

/// An inbound request, reduced to what is needed to replay it against a backend.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Outbound URL for `backend`: `{backend}/{path}[?query]`.
    pub fn target_url(&self, backend: &str) -> String {
        let mut url = format!(
            "{}/{}",
            backend.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// A backend response, copied verbatim back to the caller.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
