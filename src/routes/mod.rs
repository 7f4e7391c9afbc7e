pub mod info;
pub mod predict;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::detector::NsfwDetector;
use crate::error::ApiError;

/// Shared handler state. `detector` is `None` only when the model failed to load.
pub struct AppState {
    pub config: Config,
    pub detector: Option<Arc<NsfwDetector>>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, detector: Option<Arc<NsfwDetector>>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self {
            config,
            detector,
            http,
        })
    }

    pub fn detector(&self) -> Result<Arc<NsfwDetector>, ApiError> {
        self.detector
            .clone()
            .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Model not loaded"))
    }
}

/// Build the full API router
pub fn build_routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(info::routes())
        .merge(predict::routes())
        .fallback(not_found)
        .layer(middleware::map_response_with_state(state.clone(), too_large))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found")
}

/// Rewrite every 413, whichever layer produced it, into the JSON error shape.
async fn too_large(State(state): State<Arc<AppState>>, response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    let limit = human_size(state.config.max_upload_bytes);
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({ "error": format!("File too large (maximum {limit})") })),
    )
        .into_response()
}

/// Exact size label: whole MB or KB when the limit divides evenly, bytes otherwise.
fn human_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_labels() {
        assert_eq!(human_size(16 * 1024 * 1024), "16MB");
        assert_eq!(human_size(1024), "1KB");
        assert_eq!(human_size(1536), "1536 bytes");
        assert_eq!(human_size(1536 * 1024), "1536KB");
        assert_eq!(human_size(512), "512 bytes");
    }
}
