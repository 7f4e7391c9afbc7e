use anyhow::Result;
use image::DynamicImage;
use std::fmt;
use std::path::PathBuf;

use crate::scores::Scores;

/// Pluggable image classifier backing the detector
pub trait Classifier: Send + Sync {
    /// Classify a batch of decoded images, one `Scores` per image in input order
    fn classify(&self, images: &[DynamicImage]) -> Result<Vec<Scores>>;
}

/// Where the model weights come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory holding `model.safetensors` and `config.json`
    Local(PathBuf),
    /// Hugging Face model repo id
    Hub(String),
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Local(path) => write!(f, "{}", path.display()),
            ModelSource::Hub(repo) => write!(f, "hf://{repo}"),
        }
    }
}

pub mod preprocess;
mod vit;

pub use vit::ViTClassifier;
