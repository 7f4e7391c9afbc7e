use std::sync::Arc;

use anyhow::Context;
use nsfw_detector::{Config, NsfwDetector, logging, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env();

    // Load once up front; a missing model is fatal
    let source = config.model.clone();
    let detector = tokio::task::spawn_blocking(move || NsfwDetector::load(&source))
        .await?
        .inspect_err(|e| log::error!("Error loading model: {e}"))?
        .with_threshold(config.threshold);

    let addr = config.bind_addr();
    let state = Arc::new(routes::AppState::new(config, Some(Arc::new(detector)))?);
    let app = routes::build_routes(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    log::info!("Starting NSFW Detector API on http://{}", addr);
    log::info!("  POST /predict       - Upload file for prediction");
    log::info!("  POST /predict_url   - Predict from image URL");
    log::info!("  POST /predict_batch - Batch prediction");
    log::info!("  GET  /health        - Health check");
    log::info!("  GET  /stats         - Model statistics");
    log::info!("  GET  /              - API information");

    axum::serve(listener, app).await?;
    Ok(())
}
