//! HTTP routes
//!
//! - `GET /` and `GET /health`: liveness
//! - `POST /predict`: score one record against the current artifact
//!
//! The artifact is loaded from disk inside a blocking task on every
//! prediction, so the service never holds model state of its own.

use autoai_core::{AutoAiError, InferenceAligner, PredictionRequest, PredictionResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

pub const WELCOME_MESSAGE: &str = "Welcome to the AutoAI API!";

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub aligner: InferenceAligner,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Failures surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] AutoAiError),

    #[error("prediction task failed: {0}")]
    Task(#[from] JoinError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Core(err) if err.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!("Prediction unavailable: {}", self);
        } else {
            error!("Prediction failed: {}", self);
        }

        let payload = Json(ErrorResponse {
            detail: self.to_string(),
        });
        (status, payload).into_response()
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: WELCOME_MESSAGE,
    })
}

async fn handle_predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    debug!(fields = request.data.len(), "prediction request");
    let aligner = state.aligner.clone();
    let response = tokio::task::spawn_blocking(move || aligner.predict(&request)).await??;
    Ok(Json(response))
}
