//! NSFW image detection.
//!
//! A five-class image classifier (`drawings`, `hentai`, `neutral`, `porn`,
//! `sexy`) whose three explicit classes are summed into a single NSFW score.
//! [`NsfwDetector`] is the library surface; [`routes::build_routes`] serves it
//! over HTTP.

pub mod classes;
pub mod config;
pub mod constants;
pub mod content_filter;
pub mod detector;
pub mod error;
pub mod input;
pub mod logging;
pub mod routes;
pub mod scores;

pub use classes::NsfwClass;
pub use config::Config;
pub use content_filter::{Classifier, ModelSource};
pub use detector::{BatchEntry, BatchOutcome, ClassifyInput, NsfwDetector};
pub use scores::{ClassifyOutcome, Prediction, Scores, get_nsfw_score, is_nsfw};
