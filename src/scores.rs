//! Class probabilities and the NSFW decision derived from them.

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::classes::NsfwClass;

/// Per-class probabilities for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub drawings: f32,
    pub hentai: f32,
    pub neutral: f32,
    pub porn: f32,
    pub sexy: f32,
}

impl Scores {
    /// Map a model output row onto the class labels. Index `i` is `NsfwClass::ALL[i]`.
    pub fn from_probabilities(probs: &[f32]) -> Result<Self> {
        if probs.len() < NsfwClass::ALL.len() {
            return Err(anyhow!(
                "expected {} class probabilities, got {}",
                NsfwClass::ALL.len(),
                probs.len()
            ));
        }

        Ok(Self {
            drawings: probs[NsfwClass::Drawings.index()],
            hentai: probs[NsfwClass::Hentai.index()],
            neutral: probs[NsfwClass::Neutral.index()],
            porn: probs[NsfwClass::Porn.index()],
            sexy: probs[NsfwClass::Sexy.index()],
        })
    }

    pub fn get(&self, class: NsfwClass) -> f32 {
        match class {
            NsfwClass::Drawings => self.drawings,
            NsfwClass::Hentai => self.hentai,
            NsfwClass::Neutral => self.neutral,
            NsfwClass::Porn => self.porn,
            NsfwClass::Sexy => self.sexy,
        }
    }

    /// Highest-scoring class; ties go to the earlier class.
    pub fn top(&self) -> (NsfwClass, f32) {
        let mut best = (NsfwClass::Drawings, self.drawings);
        for class in NsfwClass::ALL.into_iter().skip(1) {
            let p = self.get(class);
            if p > best.1 {
                best = (class, p);
            }
        }
        best
    }

    /// Sum of the hentai, porn and sexy probabilities.
    pub fn nsfw_score(&self) -> f32 {
        NsfwClass::EXPLICIT.iter().map(|c| self.get(*c)).sum()
    }
}

/// Result of classifying one image: scores, or the error that prevented them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassifyOutcome {
    Scores(Scores),
    Error { error: String },
}

impl ClassifyOutcome {
    pub fn error(msg: impl Into<String>) -> Self {
        ClassifyOutcome::Error { error: msg.into() }
    }

    pub fn scores(&self) -> Option<&Scores> {
        match self {
            ClassifyOutcome::Scores(s) => Some(s),
            ClassifyOutcome::Error { .. } => None,
        }
    }
}

impl From<Result<Scores>> for ClassifyOutcome {
    fn from(res: Result<Scores>) -> Self {
        match res {
            Ok(scores) => ClassifyOutcome::Scores(scores),
            Err(e) => ClassifyOutcome::error(e.to_string()),
        }
    }
}

/// NSFW score of an outcome; errors score 0.
pub fn get_nsfw_score(outcome: &ClassifyOutcome) -> f32 {
    outcome.scores().map(Scores::nsfw_score).unwrap_or(0.0)
}

/// Whether an outcome's NSFW score reaches `threshold`; errors are never NSFW.
pub fn is_nsfw(outcome: &ClassifyOutcome, threshold: f32) -> bool {
    match outcome.scores() {
        Some(scores) => scores.nsfw_score() >= threshold,
        None => false,
    }
}

/// Full verdict for one image as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub is_nsfw: bool,
    pub nsfw_score: f32,
    pub predicted_class: NsfwClass,
    pub confidence: f32,
    pub scores: Scores,
}

impl Prediction {
    pub fn from_scores(scores: Scores, threshold: f32) -> Self {
        let nsfw_score = scores.nsfw_score();
        let (predicted_class, confidence) = scores.top();
        Self {
            is_nsfw: nsfw_score >= threshold,
            nsfw_score,
            predicted_class,
            confidence,
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_NSFW_THRESHOLD;

    fn scores(p: [f32; 5]) -> Scores {
        Scores::from_probabilities(&p).unwrap()
    }

    #[test]
    fn maps_output_index_to_class() {
        let s = scores([0.1, 0.2, 0.3, 0.25, 0.15]);
        assert_eq!(s.get(NsfwClass::Drawings), 0.1);
        assert_eq!(s.get(NsfwClass::Neutral), 0.3);
        assert_eq!(s.get(NsfwClass::Sexy), 0.15);
    }

    #[test]
    fn short_output_is_rejected() {
        assert!(Scores::from_probabilities(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn nsfw_score_sums_explicit_classes() {
        let s = scores([0.1, 0.2, 0.3, 0.25, 0.15]);
        assert!((s.nsfw_score() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn threshold_is_inclusive() {
        let outcome = ClassifyOutcome::Scores(scores([0.25, 0.25, 0.25, 0.125, 0.125]));
        assert!(is_nsfw(&outcome, 0.5));
        assert!(!is_nsfw(&outcome, 0.6));
        assert!(is_nsfw(&outcome, 0.3));
    }

    #[test]
    fn error_outcome_is_never_nsfw() {
        let outcome = ClassifyOutcome::error("cannot identify image file");
        assert_eq!(get_nsfw_score(&outcome), 0.0);
        assert!(!is_nsfw(&outcome, 0.0));
    }

    #[test]
    fn top_prefers_earlier_class_on_tie() {
        let s = scores([0.1, 0.4, 0.0, 0.4, 0.1]);
        assert_eq!(s.top(), (NsfwClass::Hentai, 0.4));
    }

    #[test]
    fn prediction_uses_summed_score_not_top_class() {
        // neutral wins, but the explicit classes together cross the threshold
        let p = Prediction::from_scores(scores([0.0, 0.2, 0.4, 0.2, 0.2]), DEFAULT_NSFW_THRESHOLD);
        assert_eq!(p.predicted_class, NsfwClass::Neutral);
        assert_eq!(p.confidence, 0.4);
        assert!(p.is_nsfw);
    }

    #[test]
    fn outcome_json_shapes() {
        let ok = ClassifyOutcome::Scores(scores([1.0, 0.0, 0.0, 0.0, 0.0]));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["drawings"], 1.0);
        assert_eq!(json.as_object().unwrap().len(), 5);

        let err = serde_json::to_value(ClassifyOutcome::error("boom")).unwrap();
        assert_eq!(err, serde_json::json!({ "error": "boom" }));
    }
}
