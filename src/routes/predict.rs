//! Prediction endpoints (/predict, /predict_url, /predict_batch)

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    routing::post,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::AppState;
use crate::content_filter::preprocess;
use crate::detector::NsfwDetector;
use crate::error::{ApiError, LogErr};
use crate::input::{allowed_file, fetch_image};
use crate::scores::Prediction;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/predict", post(predict_file))
        .route("/predict_url", post(predict_url))
        .route("/predict_batch", post(predict_batch))
}

/// One file part of a multipart upload
struct Upload {
    filename: String,
    data: Bytes,
}

fn multipart_error(e: MultipartError) -> ApiError {
    log::warn!("Multipart field error: {}", e);
    ApiError::new(e.status(), e.body_text())
}

/// Read every file part named `name`, in request order. Parts without a
/// `filename` are plain form values and are skipped.
async fn read_uploads(multipart: &mut Multipart, name: &str) -> Result<Vec<Upload>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(multipart_error)?;
        uploads.push(Upload { filename, data });
    }
    Ok(uploads)
}

/// Decode and classify one upload off the async runtime.
async fn predict_bytes(detector: Arc<NsfwDetector>, data: Bytes) -> anyhow::Result<Prediction> {
    tokio::task::spawn_blocking(move || {
        let image = preprocess::decode(&data)?;
        detector.predict(&image)
    })
    .await
    .map_err(|e| anyhow!("prediction task failed: {e}"))?
}

#[derive(Serialize)]
struct FilePredictionResponse {
    success: bool,
    filename: String,
    result: Prediction,
}

/// POST /predict - Classify a single uploaded file (multipart field `file`)
async fn predict_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FilePredictionResponse>, ApiError> {
    let detector = state.detector()?;
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file found"))?;

    let upload = read_uploads(&mut multipart, "file")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::bad_request("No file found"))?;

    if upload.filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !allowed_file(&upload.filename) {
        return Err(ApiError::bad_request("Unsupported file type"));
    }

    let result = predict_bytes(detector, upload.data)
        .await
        .log_500("File prediction error")?;

    log::info!(
        "[predict] {} -> {} (nsfw_score={:.4})",
        upload.filename,
        result.predicted_class,
        result.nsfw_score
    );

    Ok(Json(FilePredictionResponse {
        success: true,
        filename: upload.filename,
        result,
    }))
}

#[derive(Deserialize)]
struct UrlRequest {
    url: Option<Value>,
}

#[derive(Serialize)]
struct UrlPredictionResponse {
    success: bool,
    url: String,
    result: Prediction,
}

/// POST /predict_url - Download an image and classify it
async fn predict_url(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<UrlPredictionResponse>, ApiError> {
    let detector = state.detector()?;

    let url = match body {
        Ok(Json(UrlRequest {
            url: Some(Value::String(url)),
        })) => url,
        Ok(Json(UrlRequest { url: Some(other) })) => {
            log::error!("URL prediction error: invalid URL {}", other);
            return Err(ApiError::internal(format!("Invalid URL: {other}")));
        }
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::new(rejection.status(), rejection.body_text()));
        }
        _ => return Err(ApiError::bad_request("URL required")),
    };

    let image = fetch_image(&state.http, &url, state.config.max_upload_bytes)
        .await
        .log_500("Error downloading image from URL")?;

    let result = tokio::task::spawn_blocking(move || detector.predict(&image))
        .await
        .log_500("URL prediction task error")?
        .log_500("URL prediction error")?;

    log::info!(
        "[predict_url] {} -> {} (nsfw_score={:.4})",
        url,
        result.predicted_class,
        result.nsfw_score
    );

    Ok(Json(UrlPredictionResponse {
        success: true,
        url,
        result,
    }))
}

#[derive(Serialize)]
struct BatchItem {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchItem {
    fn failed(filename: String, error: impl Into<String>) -> Self {
        Self {
            filename,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize)]
struct BatchPredictionResponse {
    success: bool,
    total_files: usize,
    results: Vec<BatchItem>,
}

/// POST /predict_batch - Classify every `files` part; bad files get an error entry
/// Valid images are classified together in one forward pass.
async fn predict_batch(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchPredictionResponse>, ApiError> {
    let detector = state.detector()?;
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No files found"))?;

    let uploads = read_uploads(&mut multipart, "files").await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files found"));
    }
    let total_files = uploads.len();

    let results = tokio::task::spawn_blocking(move || classify_uploads(&detector, uploads))
        .await
        .log_500("Batch prediction error")?;

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    log::info!(
        "[predict_batch] Batch complete: {} classified, {} failed",
        total_files - failed,
        failed
    );

    Ok(Json(BatchPredictionResponse {
        success: true,
        total_files,
        results,
    }))
}

fn classify_uploads(detector: &NsfwDetector, uploads: Vec<Upload>) -> Vec<BatchItem> {
    let mut items = Vec::with_capacity(uploads.len());
    let mut decoded = Vec::new();

    for upload in uploads {
        if upload.filename.is_empty() || !allowed_file(&upload.filename) {
            items.push(BatchItem::failed(upload.filename, "Invalid file"));
            continue;
        }
        match preprocess::decode(&upload.data) {
            Ok(image) => {
                decoded.push((items.len(), image));
                items.push(BatchItem {
                    filename: upload.filename,
                    result: None,
                    error: None,
                });
            }
            Err(e) => {
                log::error!("Prediction error for file {}: {}", upload.filename, e);
                items.push(BatchItem::failed(upload.filename, e.to_string()));
            }
        }
    }

    if decoded.is_empty() {
        return items;
    }

    let (slots, images): (Vec<usize>, Vec<_>) = decoded.into_iter().unzip();
    match detector.predict_many(&images) {
        Ok(predictions) => {
            for (slot, prediction) in slots.into_iter().zip(predictions) {
                items[slot].result = Some(prediction);
            }
        }
        Err(e) => {
            log::error!("Batch forward pass failed: {}", e);
            for slot in slots {
                items[slot].error = Some(e.to_string());
            }
        }
    }

    items
}
