use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server pool is empty")]
    PoolEmpty,

    #[error("Backend '{0}' is not a member of the pool")]
    MemberNotFound(String),

    #[error("Backend '{0}' is already a member of the pool")]
    DuplicateMember(String),

    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::PoolEmpty => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::DuplicateMember(_) => StatusCode::CONFLICT,
            ProxyError::BackendUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Http(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            ProxyError::Config(_) => "configuration_error",
            ProxyError::PoolEmpty => "internal_error",
            ProxyError::MemberNotFound(_) => "member_not_found",
            ProxyError::DuplicateMember(_) => "duplicate_member",
            ProxyError::BackendUnreachable(_) => "service_unavailable",
            ProxyError::InvalidRequest(_) => "invalid_request",
            ProxyError::Http(_) => "bad_gateway",
            ProxyError::Internal(_) => "internal_error",
        }
    }

    /// Message shown to the caller. Server-side failures get a fixed text so
    /// backend addresses and causes stay in the logs only.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::SERVICE_UNAVAILABLE => "Service unavailable".to_string(),
            StatusCode::BAD_GATEWAY => "Bad gateway".to_string(),
            status if status.is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

// Implement IntoResponse for ProxyError to convert errors into HTTP responses
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = self.to_string();

        tracing::error!(
            error_type = error_type,
            status = status.as_u16(),
            message = %message,
            "Request failed"
        );

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.public_message(),
                "code": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
