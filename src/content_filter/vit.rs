use anyhow::{Result, anyhow};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::vit;
use hf_hub::{Repo, RepoType, api::sync::Api};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Classifier, ModelSource, preprocess};
use crate::classes::{INPUT_SIZE, NsfwClass};
use crate::scores::Scores;

const WEIGHTS_FILE: &str = "model.safetensors";
const CONFIG_FILE: &str = "config.json";

/// ViT image classifier with the five NSFW labels as its head
pub struct ViTClassifier {
    model: Mutex<vit::Model>,
    device: Device,
}

impl ViTClassifier {
    pub fn load(source: &ModelSource) -> Result<Self> {
        #[cfg(feature = "metal")]
        let device = Device::new_metal(0).unwrap_or(Device::Cpu);
        #[cfg(not(feature = "metal"))]
        let device = Device::Cpu;

        log::info!("Loading NSFW model from {} on {:?}", source, device);

        let (model_path, config_path) = match source {
            ModelSource::Local(dir) => local_files(dir)?,
            ModelSource::Hub(repo_id) => {
                let api = Api::new()?;
                let repo = api.repo(Repo::new(repo_id.clone(), RepoType::Model));
                (repo.get(WEIGHTS_FILE)?, repo.get(CONFIG_FILE)?)
            }
        };

        let config: vit::Config = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[model_path], DType::F32, &device)? };
        let model = vit::Model::new(&config, NsfwClass::ALL.len(), vb)?;

        log::info!("NSFW model loaded successfully");

        Ok(Self {
            model: Mutex::new(model),
            device,
        })
    }
}

fn local_files(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    if !dir.exists() {
        return Err(anyhow!("Model file not found: {}", dir.display()));
    }
    let weights = dir.join(WEIGHTS_FILE);
    let config = dir.join(CONFIG_FILE);
    for path in [&weights, &config] {
        if !path.is_file() {
            return Err(anyhow!("Model file not found: {}", path.display()));
        }
    }
    Ok((weights, config))
}

impl Classifier for ViTClassifier {
    fn classify(&self, images: &[DynamicImage]) -> Result<Vec<Scores>> {
        if images.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = images.len();
        let data = preprocess::batch_input(images);
        let input = Tensor::from_vec(data, (batch_size, 3, INPUT_SIZE, INPUT_SIZE), &self.device)?;

        let model = self.model.lock().map_err(|e| anyhow!("Lock error: {}", e))?;
        log::debug!("running forward pass on {} images", batch_size);
        let logits = model.forward(&input)?;
        drop(model);

        // Softmax to get probabilities - shape is (batch_size, 5)
        let probs = candle_nn::ops::softmax(&logits, 1)?;
        let probs_vec: Vec<f32> = probs.flatten_all()?.to_vec1()?;

        probs_vec
            .chunks(NsfwClass::ALL.len())
            .map(Scores::from_probabilities)
            .collect()
    }
}
