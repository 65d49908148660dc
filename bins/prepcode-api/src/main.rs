mod auth;
mod config;
mod engine;
mod error;
mod evaluator;
mod executor;
mod handlers;
mod language_config;
mod metrics;
mod routes;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use config::{Config, LogFormat};
use engine::{ExecutionEngine, PistonEngine};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use store::{ProgressStore, QuestionStore, RedisStore};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub struct AppState {
    pub engine: Arc<dyn ExecutionEngine>,
    pub questions: Arc<dyn QuestionStore>,
    pub progress: Arc<dyn ProgressStore>,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, draining in-flight requests...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    info!("prepcode API booting...");

    // Connect to Redis
    let client = redis::Client::open(config.redis_url.as_str())
        .context("Failed to create Redis client")?;
    let redis_conn = ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;

    info!("Connected to Redis");

    let engine = PistonEngine::new(
        &config.engine_url,
        Duration::from_millis(config.engine_timeout_ms),
    )
    .context("Failed to build execution engine client")?;

    info!(
        engine_url = %config.engine_url,
        timeout_ms = config.engine_timeout_ms,
        "Execution engine configured"
    );

    let store = RedisStore::new(redis_conn);
    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        questions: Arc::new(store.clone()),
        progress: Arc::new(store),
    });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
