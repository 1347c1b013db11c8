//! AutoAI prediction service
//!
//! Serves predictions from the artifact written by `autoai-train`. The
//! artifact is read from disk per request; retraining replaces it atomically
//! and the next request sees the new model.

pub mod api;
pub mod config;

use anyhow::{Context, Result};
use autoai_core::InferenceAligner;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use api::{build_router, AppState, ServiceError, SharedState, WELCOME_MESSAGE};
pub use autoai_core::{init_logging, LogFormat, LoggingConfig};
pub use config::ServiceConfig;

/// Router for `config`, without binding a socket
pub fn app(config: &ServiceConfig) -> axum::Router {
    let aligner = InferenceAligner::new(&config.artifact_path).with_fill(config.fill_policy());
    build_router(Arc::new(AppState { aligner }))
}

/// Bind and serve until interrupted.
pub async fn start_server(config: &ServiceConfig) -> Result<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("AutoAI API listening on {}", addr);
    info!("Serving artifact: {}", config.artifact_path.display());

    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Prediction server terminated unexpectedly")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
