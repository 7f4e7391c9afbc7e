//! Library entry point: a loaded model plus the decision threshold.
//!
//! ```no_run
//! use nsfw_detector::{ClassifyInput, ModelSource, NsfwDetector, get_nsfw_score, is_nsfw};
//!
//! let detector = NsfwDetector::load(&ModelSource::Local("models/nsfw".into()))?;
//! for (name, outcome) in detector.classify(ClassifyInput::Path("photos".into()))? {
//!     println!("{name}: {:.4} strict={}", get_nsfw_score(&outcome), is_nsfw(&outcome, 0.3));
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_NSFW_THRESHOLD;
use crate::content_filter::{Classifier, ModelSource, ViTClassifier, preprocess};
use crate::input;
use crate::scores::{ClassifyOutcome, Prediction, Scores};

/// What to classify with [`NsfwDetector::classify`].
#[derive(Debug, Clone)]
pub enum ClassifyInput {
    /// A single image file, or a directory scanned for image files
    Path(PathBuf),
    Paths(Vec<PathBuf>),
}

/// One entry of [`NsfwDetector::predict_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub image_path: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Prediction(Prediction),
    Error { error: String },
}

pub struct NsfwDetector {
    classifier: Box<dyn Classifier>,
    source: String,
    threshold: f32,
}

impl NsfwDetector {
    /// Load the ViT classifier from `source`. Fails if the weights are unavailable.
    pub fn load(source: &ModelSource) -> Result<Self> {
        let classifier = ViTClassifier::load(source)?;
        Ok(Self::new(Box::new(classifier), source.to_string()))
    }

    pub fn new(classifier: Box<dyn Classifier>, source: impl Into<String>) -> Self {
        Self {
            classifier,
            source: source.into(),
            threshold: DEFAULT_NSFW_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Human-readable model location.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn scores(&self, image: &DynamicImage) -> Result<Scores> {
        self.classifier
            .classify(std::slice::from_ref(image))?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Prediction failed"))
    }

    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        let scores = self.scores(image)?;
        Ok(Prediction::from_scores(scores, self.threshold))
    }

    /// Predict several decoded images in a single forward pass.
    pub fn predict_many(&self, images: &[DynamicImage]) -> Result<Vec<Prediction>> {
        let scores = self.classifier.classify(images)?;
        if scores.len() != images.len() {
            return Err(anyhow!(
                "Prediction failed: {} results for {} images",
                scores.len(),
                images.len()
            ));
        }
        Ok(scores
            .into_iter()
            .map(|s| Prediction::from_scores(s, self.threshold))
            .collect())
    }

    pub fn predict_path(&self, path: &Path) -> Result<Prediction> {
        let image = preprocess::open(path)?;
        self.predict(&image)
    }

    /// Predict every path, recording failures per entry instead of aborting.
    pub fn predict_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<BatchEntry> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let outcome = match self.predict_path(path) {
                    Ok(prediction) => BatchOutcome::Prediction(prediction),
                    Err(e) => {
                        log::error!("Prediction error for image {}: {}", path.display(), e);
                        BatchOutcome::Error {
                            error: e.to_string(),
                        }
                    }
                };
                BatchEntry {
                    image_path: path.display().to_string(),
                    outcome,
                }
            })
            .collect()
    }

    /// Raw scores keyed by file name. Only listing a directory can fail as a whole.
    pub fn classify(&self, target: ClassifyInput) -> Result<BTreeMap<String, ClassifyOutcome>> {
        let paths = match target {
            ClassifyInput::Path(path) if path.is_dir() => input::scan_dir(&path)?,
            ClassifyInput::Path(path) => vec![path],
            ClassifyInput::Paths(paths) => paths,
        };

        let mut results = BTreeMap::new();
        for path in paths {
            let outcome: ClassifyOutcome = preprocess::open(&path)
                .and_then(|img| self.scores(&img))
                .into();
            if let ClassifyOutcome::Error { error } = &outcome {
                log::warn!("Could not classify {}: {}", path.display(), error);
            }
            results.insert(basename(&path), outcome);
        }
        Ok(results)
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::NsfwClass;
    use image::{ImageFormat, RgbImage};

    /// Scores images by their width: wide images look explicit.
    struct WidthClassifier;

    impl Classifier for WidthClassifier {
        fn classify(&self, images: &[DynamicImage]) -> Result<Vec<Scores>> {
            images
                .iter()
                .map(|img| {
                    if img.width() > 8 {
                        Scores::from_probabilities(&[0.0, 0.1, 0.1, 0.7, 0.1])
                    } else {
                        Scores::from_probabilities(&[0.1, 0.0, 0.9, 0.0, 0.0])
                    }
                })
                .collect()
        }
    }

    fn detector() -> NsfwDetector {
        NsfwDetector::new(Box::new(WidthClassifier), "stub")
    }

    fn write_png(dir: &Path, name: &str, width: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::new(width, 4)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn predict_applies_threshold() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(16, 4));
        let p = detector().predict(&img).unwrap();
        assert!(p.is_nsfw);
        assert_eq!(p.predicted_class, NsfwClass::Porn);

        let strict = detector().with_threshold(0.95);
        assert!(!strict.predict(&img).unwrap().is_nsfw);
    }

    #[test]
    fn predict_many_keeps_order() {
        let images = [
            DynamicImage::ImageRgb8(RgbImage::new(2, 2)),
            DynamicImage::ImageRgb8(RgbImage::new(20, 2)),
        ];
        let predictions = detector().predict_many(&images).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].predicted_class, NsfwClass::Neutral);
        assert_eq!(predictions[1].predicted_class, NsfwClass::Porn);
    }

    #[test]
    fn batch_keeps_going_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "ok.png", 2);
        let missing = dir.path().join("missing.png");

        let entries = detector().predict_batch(&[missing.clone(), good.clone()]);
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].outcome, BatchOutcome::Error { .. }));
        match &entries[1].outcome {
            BatchOutcome::Prediction(p) => assert!(!p.is_nsfw),
            other => panic!("unexpected outcome {other:?}"),
        }

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["image_path"], missing.display().to_string());
        assert!(json["error"].is_string());
    }

    #[test]
    fn classify_directory_by_basename() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "wide.png", 32);
        write_png(dir.path(), "narrow.png", 2);
        std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"skip me").unwrap();

        let results = detector()
            .classify(ClassifyInput::Path(dir.path().to_path_buf()))
            .unwrap();

        let names: Vec<_> = results.keys().map(String::as_str).collect();
        assert_eq!(names, ["broken.jpg", "narrow.png", "wide.png"]);
        assert!(crate::is_nsfw(&results["wide.png"], 0.5));
        assert!(!crate::is_nsfw(&results["narrow.png"], 0.5));
        assert!(matches!(results["broken.jpg"], ClassifyOutcome::Error { .. }));
    }

    #[test]
    fn classify_single_missing_file_is_an_entry() {
        let results = detector()
            .classify(ClassifyInput::Paths(vec!["/nonexistent/a.png".into()]))
            .unwrap();
        assert!(matches!(results["a.png"], ClassifyOutcome::Error { .. }));
    }
}
