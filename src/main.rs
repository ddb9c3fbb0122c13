use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backends;
mod config;
mod logging;
mod pool;
mod proxy;
mod server;
mod types;

use config::load_config;
use pool::{SeededRandom, ServerPool};
use proxy::{Forwarder, ProxyClient};
use server::{build_admin_router, build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pool_balancer=info,tower_http=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    tracing::info!("Loading configuration from: {}", config_path);

    let config = load_config(&config_path)?;
    tracing::info!(
        "Configuration loaded successfully with {} backends",
        config.backends.len()
    );

    // Populate the server pool
    let pool = Arc::new(match config.pool.seed {
        Some(seed) => {
            tracing::info!(seed, "Using seeded backend selection");
            ServerPool::with_random(SeededRandom::new(seed))
        }
        None => ServerPool::new(),
    });
    for backend in &config.backends {
        pool.add(backend.clone())?;
        tracing::info!(backend = %backend, "Registered backend");
    }

    let client = Arc::new(ProxyClient::new(&config.client)?);
    let forwarder = Arc::new(Forwarder::new(pool, client));

    let config = Arc::new(config);
    let state = AppState {
        forwarder,
        config: config.clone(),
    };

    let admin = if config.admin.enabled {
        let admin_addr = format!("{}:{}", config.admin.host, config.admin.port);
        let listener = tokio::net::TcpListener::bind(&admin_addr).await?;
        tracing::info!("Admin endpoints listening on {}", admin_addr);
        let app = build_admin_router(state.clone());
        Some(tokio::spawn(async move { axum::serve(listener, app).await }))
    } else {
        tracing::info!("Admin endpoints disabled");
        None
    };

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting load balancer on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let app = build_router(state);

    match admin {
        Some(admin) => {
            tokio::select! {
                result = async { axum::serve(listener, app).await } => result?,
                result = admin => result??,
            }
        }
        None => axum::serve(listener, app).await?,
    }

    Ok(())
}
