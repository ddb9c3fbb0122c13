use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::validate_backend,
    pool::ServerPool,
    server::AppState,
    types::{ProxyError, Result},
};

/// Body of add/remove calls.
#[derive(Debug, Deserialize)]
pub struct BackendRequest {
    pub backend: String,
}

/// Admin routes, served on the separate admin listener.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check)).route(
        "/backends",
        get(list_backends).post(add_backend).delete(remove_backend),
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn list_backends(State(state): State<AppState>) -> Json<Value> {
    Json(listing(state.forwarder.pool()))
}

async fn add_backend(
    State(state): State<AppState>,
    Json(request): Json<BackendRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    validate_backend(&request.backend).map_err(ProxyError::InvalidRequest)?;

    let pool = state.forwarder.pool();
    let size = pool.add(request.backend.clone())?;
    tracing::info!(backend = %request.backend, size, "Backend added to pool");

    Ok((StatusCode::CREATED, Json(listing(pool))))
}

async fn remove_backend(
    State(state): State<AppState>,
    Json(request): Json<BackendRequest>,
) -> Result<Json<Value>> {
    let pool = state.forwarder.pool();
    let size = pool.remove(&request.backend)?;
    tracing::info!(backend = %request.backend, size, "Backend removed from pool");

    if size == 0 {
        tracing::warn!("Server pool is now empty; requests will fail until a backend is added");
    }

    Ok(Json(listing(pool)))
}

fn listing(pool: &ServerPool) -> Value {
    let backends = pool.members();
    json!({
        "backends": backends,
        "count": backends.len(),
    })
}
