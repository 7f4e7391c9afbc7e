//! Classify image files or a directory of images from the command line.
//!
//! ```text
//! nsfw-classify photo.jpg
//! nsfw-classify --model-path models/nsfw --strict-threshold 0.3 ./photos
//! nsfw-classify --json a.png b.png
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nsfw_detector::constants::{DEFAULT_MODEL_REPO, DEFAULT_NSFW_THRESHOLD};
use nsfw_detector::{
    ClassifyInput, ClassifyOutcome, ModelSource, NsfwDetector, get_nsfw_score, is_nsfw, logging,
};

#[derive(Parser, Debug)]
#[command(name = "nsfw-classify", version, about = "Score images for NSFW content")]
struct Args {
    /// Image files, or a single directory to scan
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Local model directory (model.safetensors + config.json)
    #[arg(long, env = "NSFW_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Hugging Face repo used when no local model is given
    #[arg(long, env = "NSFW_MODEL_REPO", default_value = DEFAULT_MODEL_REPO)]
    model_repo: String,

    /// Decision threshold on the summed hentai+porn+sexy score
    #[arg(long, default_value_t = DEFAULT_NSFW_THRESHOLD)]
    threshold: f32,

    /// Also report the decision at this stricter threshold
    #[arg(long)]
    strict_threshold: Option<f32>,

    /// Print raw scores as JSON instead of a report
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    let source = match args.model_path.clone() {
        Some(path) => ModelSource::Local(path),
        None => ModelSource::Hub(args.model_repo.clone()),
    };

    let detector = match NsfwDetector::load(&source) {
        Ok(d) => d.with_threshold(args.threshold),
        Err(e) => {
            eprintln!("Error loading model: {e}");
            return ExitCode::FAILURE;
        }
    };

    let input = match args.inputs.as_slice() {
        [single] => ClassifyInput::Path(single.clone()),
        many => ClassifyInput::Paths(many.to_vec()),
    };

    let results = match detector.classify(input) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if results.is_empty() {
        eprintln!("No image files found.");
        return ExitCode::FAILURE;
    }

    if args.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    for (name, outcome) in &results {
        print_report(name, outcome, detector.threshold(), args.strict_threshold);
    }
    ExitCode::SUCCESS
}

fn print_report(name: &str, outcome: &ClassifyOutcome, threshold: f32, strict: Option<f32>) {
    let Some(scores) = outcome.scores() else {
        if let ClassifyOutcome::Error { error } = outcome {
            println!("{name}: Error - {error}");
        }
        return;
    };

    let (class, confidence) = scores.top();
    println!("{name}:");
    println!("  NSFW Score: {:.4}", get_nsfw_score(outcome));
    println!("  Is NSFW (threshold={threshold}): {}", is_nsfw(outcome, threshold));
    if let Some(strict) = strict {
        println!("  Is NSFW (threshold={strict}): {}", is_nsfw(outcome, strict));
    }
    println!("  Predicted: {class} ({confidence:.4})");
}
