pub mod admin;
pub mod forward;

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{config::Config, proxy::Forwarder};

pub use forward::forward_handler;

#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub config: Arc<Config>,
}

/// Public router: every request is forwarded to a pool member.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(forward_handler)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for the admin listener. It shares the pool with the public router.
pub fn build_admin_router(state: AppState) -> Router {
    admin::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
