//! Runtime configuration read from the environment.
//!
//! ## Environment Variables
//! - `NSFW_MODEL_PATH` - local model directory (optional, wins over the repo)
//! - `NSFW_MODEL_REPO` - Hugging Face repo id (default: `LukeJacob2023/nsfw-image-detector`)
//! - `NSFW_THRESHOLD` - decision threshold in `[0, 1]` (default: `0.5`)
//! - `HOST` / `PORT` - bind address (default: `0.0.0.0:5000`)
//! - `MAX_UPLOAD_BYTES` - request body limit (default: 16 MB)
//! - `URL_FETCH_TIMEOUT_SECS` - timeout for `/predict_url` downloads (default: `10`)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_HOST, DEFAULT_MODEL_REPO, DEFAULT_NSFW_THRESHOLD, DEFAULT_PORT, MAX_UPLOAD_SIZE,
    URL_FETCH_TIMEOUT_SECS,
};
use crate::content_filter::ModelSource;

#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelSource,
    pub threshold: f32,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelSource::Hub(DEFAULT_MODEL_REPO.to_string()),
            threshold: DEFAULT_NSFW_THRESHOLD,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: MAX_UPLOAD_SIZE,
            fetch_timeout: Duration::from_secs(URL_FETCH_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let model = match lookup("NSFW_MODEL_PATH").filter(|s| !s.is_empty()) {
            Some(path) => ModelSource::Local(PathBuf::from(path)),
            None => lookup("NSFW_MODEL_REPO")
                .filter(|s| !s.is_empty())
                .map(ModelSource::Hub)
                .unwrap_or(defaults.model),
        };

        let threshold = lookup("NSFW_THRESHOLD")
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(defaults.threshold);

        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.port);

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_upload_bytes);

        let fetch_timeout = lookup("URL_FETCH_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        Self {
            model,
            threshold,
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            max_upload_bytes,
            fetch_timeout,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.model, ModelSource::Hub(DEFAULT_MODEL_REPO.to_string()));
        assert_eq!(c.threshold, 0.5);
        assert_eq!(c.bind_addr(), "0.0.0.0:5000");
        assert_eq!(c.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(c.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn local_path_wins_over_repo() {
        let c = config(&[("NSFW_MODEL_PATH", "models/nsfw"), ("NSFW_MODEL_REPO", "x/y")]);
        assert_eq!(c.model, ModelSource::Local("models/nsfw".into()));

        let c = config(&[("NSFW_MODEL_REPO", "x/y")]);
        assert_eq!(c.model, ModelSource::Hub("x/y".into()));
    }

    #[test]
    fn invalid_values_fall_back() {
        let c = config(&[("NSFW_THRESHOLD", "1.5"), ("PORT", "zero"), ("MAX_UPLOAD_BYTES", "0")]);
        assert_eq!(c.threshold, 0.5);
        assert_eq!(c.port, 5000);
        assert_eq!(c.max_upload_bytes, MAX_UPLOAD_SIZE);

        let c = config(&[("NSFW_THRESHOLD", "0.3"), ("PORT", "8080")]);
        assert_eq!(c.threshold, 0.3);
        assert_eq!(c.port, 8080);
    }
}
