//! Service metadata endpoints (/, /health, /stats)

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::AppState;
use crate::classes::{INPUT_SIZE, NsfwClass};
use crate::constants::API_VERSION;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/stats", get(stats))
}

/// GET / - API description
async fn home() -> Json<Value> {
    Json(json!({
        "message": "NSFW Detector API",
        "version": API_VERSION,
        "endpoints": {
            "POST /predict": "Upload file for NSFW prediction",
            "POST /predict_url": "Predict NSFW from image URL",
            "POST /predict_batch": "Batch prediction with multiple files",
            "GET /health": "Health check",
            "GET /stats": "Model statistics",
        }
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// GET /health - 503 until a model is loaded
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    if state.detector.is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error",
                message: "Model not loaded",
            }),
        );
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            message: "API is running",
        }),
    )
}

#[derive(Serialize)]
struct StatsResponse {
    model_path: String,
    classes: [NsfwClass; 5],
    input_size: [usize; 2],
    model_loaded: bool,
    threshold: f32,
    version: &'static str,
}

/// GET /stats - Model statistics
async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let (model_path, threshold) = match &state.detector {
        Some(detector) => (detector.source().to_string(), detector.threshold()),
        None => (state.config.model.to_string(), state.config.threshold),
    };

    Json(StatsResponse {
        model_path,
        classes: NsfwClass::ALL,
        input_size: [INPUT_SIZE, INPUT_SIZE],
        model_loaded: state.detector.is_some(),
        threshold,
        version: API_VERSION,
    })
}
