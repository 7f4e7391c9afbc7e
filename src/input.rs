//! Input collaborators: filename allow-lists, directory scanning and URL fetching.

use anyhow::{Result, anyhow};
use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::constants::{SCAN_EXTENSIONS, UPLOAD_EXTENSIONS};
use crate::content_filter::preprocess;

/// Lower-cased text after the last `.` of a filename, if any.
fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Whether an uploaded filename carries an accepted image extension.
pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

fn is_scannable(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(extension)
        .is_some_and(|ext| SCAN_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly inside `dir`, sorted by path. Subdirectories are not entered.
pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_scannable(p))
        .collect();
    files.sort();
    Ok(files)
}

fn too_large(max_bytes: usize) -> anyhow::Error {
    anyhow!("Image too large (maximum {} bytes)", max_bytes)
}

/// Download an image over HTTP and decode it. Bodies over `max_bytes` are rejected.
pub async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<DynamicImage> {
    let response = client.get(url).send().await?.error_for_status()?;

    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(too_large(max_bytes));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("image/") {
        return Err(anyhow!("URL does not point to an image file"));
    }

    let body = response.bytes().await?;
    if body.len() > max_bytes {
        return Err(too_large(max_bytes));
    }
    preprocess::decode(&body)
}
