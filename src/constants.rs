//! Application constants

/// API version reported by `/` and `/stats`
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hugging Face repo the classifier weights are pulled from by default
pub const DEFAULT_MODEL_REPO: &str = "LukeJacob2023/nsfw-image-detector";

/// Summed explicit-class probability at or above which an image is NSFW
pub const DEFAULT_NSFW_THRESHOLD: f32 = 0.5;

/// Maximum request body size (16 MB)
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Timeout for fetching images by URL
pub const URL_FETCH_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Extensions accepted for uploaded files
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Extensions picked up when classifying a directory
pub const SCAN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff"];
