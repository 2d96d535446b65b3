//! HTTP server for driver behavior predictions.
//!
//! This module provides an HTTP server that:
//! - Accepts a windowed feature vector via POST /predict
//! - Classifies it with the model loaded at startup
//! - Appends every served prediction to the daily prediction log
//!
//! # Architecture
//!
//! ```text
//! Client ──→ POST /predict ──→ PredictionService ──→ Classifier
//!                                     ↓
//!                          logs/predictions_<day>.jsonl
//! ```

use crate::audit::StatsSnapshot;
use crate::service::{PredictError, Prediction, PredictionService};
use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Response header telling the caller whether the prediction was logged.
pub const LOGGED_HEADER: &str = "x-prediction-logged";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (port 0 for random)
    pub addr: SocketAddr,
    /// Model artifact loaded at startup
    pub model_path: PathBuf,
    /// Directory for daily prediction logs
    pub log_dir: PathBuf,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(addr: SocketAddr, model_path: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            addr,
            model_path,
            log_dir,
        }
    }
}

/// Body of POST /predict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub features: Vec<f64>,
}

/// Liveness response
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of features the loaded model expects
    pub features: usize,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<PredictError> for ErrorResponse {
    fn from(err: PredictError) -> Self {
        let code = match err {
            PredictError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            PredictError::NonFiniteFeature { .. } => "INVALID_FEATURES",
            PredictError::Inference(_) => "INFERENCE_ERROR",
        };
        Self {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Driver behavior prediction API is live.".to_string(),
    })
}

/// GET /health
async fn health(State(service): State<Arc<PredictionService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: service.schema().len(),
    })
}

/// GET /stats
async fn stats(State(service): State<Arc<PredictionService>>) -> Json<StatsSnapshot> {
    Json(service.stats().snapshot())
}

/// POST /predict
///
/// Validates the feature count, classifies, and logs the prediction. A
/// failed log append still returns the prediction, flagged through the
/// `x-prediction-logged` header.
async fn predict(
    State(service): State<Arc<PredictionService>>,
    Json(request): Json<PredictionRequest>,
) -> Result<([(HeaderName, HeaderValue); 1], Json<Prediction>), ApiError> {
    // Classification and the file append are blocking work.
    let outcome = tokio::task::spawn_blocking(move || service.predict(&request.features))
        .await
        .map_err(|e| {
            tracing::error!("Prediction task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Prediction task failed: {}", e),
                    code: "INFERENCE_ERROR".to_string(),
                }),
            )
        })?
        .map_err(|e| {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(ErrorResponse::from(e)))
        })?;

    let logged = HeaderValue::from_static(if outcome.is_logged() { "true" } else { "false" });
    Ok((
        [(HeaderName::from_static(LOGGED_HEADER), logged)],
        Json(outcome.prediction),
    ))
}

/// Build the router around a loaded service.
pub fn router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/predict", post(predict))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve an already loaded service.
pub async fn serve(
    service: Arc<PredictionService>,
    addr: SocketAddr,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(service);

    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Prediction server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

/// Load the model and run the HTTP server.
///
/// A model that cannot be loaded fails here, before the listener is bound.
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let service = PredictionService::load(&config.model_path, config.log_dir.clone())?;
    serve(Arc::new(service), config.addr).await
}
