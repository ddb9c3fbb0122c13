use crate::config::LoggingConfig;
use chrono::{DateTime, Utc};
use http::header::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct RequestLog {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamRequestLog {
    pub timestamp: DateTime<Utc>,
    pub backend: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamResponseLog {
    pub timestamp: DateTime<Utc>,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-request logger; durations are measured from its creation.
pub struct RequestLogger {
    config: LoggingConfig,
    start_time: Instant,
}

impl RequestLogger {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
        }
    }

    pub fn log_request(&self, method: &str, path: &str, headers: &HeaderMap, body: Option<&str>) {
        if !self.config.enabled {
            return;
        }

        let headers_map = self.headers_if_enabled(headers);
        let body_str = self.body_if_enabled(body);

        tracing::info!(
            method = method,
            path = path,
            headers = ?headers_map,
            body = ?body_str,
            "Incoming request"
        );
    }

    pub fn log_upstream_request(
        &self,
        backend: &str,
        url: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) {
        if !self.config.enabled {
            return;
        }

        let log = UpstreamRequestLog {
            timestamp: Utc::now(),
            backend: backend.to_string(),
            url: url.to_string(),
            headers: self.headers_if_enabled(headers),
            body: self.body_if_enabled(body),
        };

        tracing::info!(
            log = ?log,
            "Forwarding request"
        );
    }

    pub fn log_upstream_response(
        &self,
        backend: &str,
        status_code: Option<u16>,
        headers: Option<&HeaderMap>,
        error: Option<&str>,
    ) {
        if !self.config.enabled {
            return;
        }

        let log = UpstreamResponseLog {
            timestamp: Utc::now(),
            backend: backend.to_string(),
            status_code,
            duration_ms: self.elapsed_ms(),
            headers: headers.and_then(|h| self.headers_if_enabled(h)),
            error: error.map(|s| s.to_string()),
        };

        if log.error.is_some() {
            tracing::warn!(log = ?log, "Upstream failed");
        } else {
            tracing::info!(log = ?log, "Upstream response");
        }
    }

    pub fn log_response(&self, method: &str, path: &str, status_code: u16, error: Option<&str>) {
        if !self.config.enabled {
            return;
        }

        let log = RequestLog {
            timestamp: Utc::now(),
            method: method.to_string(),
            path: path.to_string(),
            status_code,
            duration_ms: self.elapsed_ms(),
            error: error.map(|s| s.to_string()),
        };

        if status_code >= 500 {
            tracing::error!(log = ?log, "Request completed");
        } else if status_code >= 400 {
            tracing::warn!(log = ?log, "Request completed");
        } else {
            tracing::info!(log = ?log, "Request completed");
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    fn headers_if_enabled(&self, headers: &HeaderMap) -> Option<HashMap<String, String>> {
        self.config
            .include_headers
            .then(|| Self::headers_to_map(headers))
    }

    fn body_if_enabled(&self, body: Option<&str>) -> Option<String> {
        if self.config.include_body {
            body.map(|s| s.to_string())
        } else {
            None
        }
    }

    fn headers_to_map(headers: &HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                let key = name.to_string();
                let val = value.to_str().unwrap_or("<invalid>").to_string();

                // Redact sensitive headers
                let val = if Self::is_sensitive_header(&key) {
                    "[REDACTED]".to_string()
                } else {
                    val
                };

                (key, val)
            })
            .collect()
    }

    fn is_sensitive_header(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains("authorization")
            || lower.contains("api-key")
            || lower.contains("api_key")
            || lower.contains("apikey")
            || lower.contains("cookie")
            || lower.contains("token")
            || lower.contains("password")
            || lower.contains("secret")
    }
}
