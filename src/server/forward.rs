use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};

use crate::{
    logging::RequestLogger,
    server::AppState,
    types::{ForwardRequest, ForwardResponse, ProxyError, Result},
};

/// Fallback handler: every request not claimed by another route goes to a
/// backend from the pool.
pub async fn forward_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let logger = RequestLogger::new(state.config.logging.clone());
    let path = uri.path().to_string();
    logger.log_request(method.as_str(), &path, &headers, std::str::from_utf8(&body).ok());

    let request = ForwardRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(|q| q.to_string()),
        headers,
        body,
    };

    let result = state
        .forwarder
        .forward(request, &logger)
        .await
        .and_then(build_response);

    match result {
        Ok(response) => {
            logger.log_response(method.as_str(), &path, response.status().as_u16(), None);
            response
        }
        Err(err) => {
            let message = err.to_string();
            let response = err.into_response();
            logger.log_response(
                method.as_str(),
                &path,
                response.status().as_u16(),
                Some(&message),
            );
            response
        }
    }
}

fn build_response(upstream: ForwardResponse) -> Result<Response> {
    let mut response_builder = Response::builder().status(upstream.status);

    // Copy headers verbatim, repeated values included
    for (name, value) in upstream.headers.iter() {
        response_builder = response_builder.header(name, value);
    }

    response_builder
        .body(Body::from(upstream.body))
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {}", e)))
}
