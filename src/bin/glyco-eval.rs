//! Evaluate a saved model against a labeled CSV.

use std::path::PathBuf;

use glyco::config;
use glyco::dataset::{load_csv, stratified_split};
use glyco::inference::InferenceService;
use glyco::logging;
use glyco::ml::metrics::ClassificationReport;
use glyco::training;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("info") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    let model_path = options.model.unwrap_or(config.paths.model);
    let dataset_path = options.dataset.unwrap_or(config.paths.dataset);

    let service = InferenceService::load(&model_path).map_err(|err| err.to_string())?;
    let mut dataset = load_csv(&dataset_path).map_err(|err| err.to_string())?;
    if options.holdout {
        dataset = stratified_split(&dataset, config.training.test_fraction, config.training.seed)
            .map_err(|err| err.to_string())?
            .test;
    }

    let confusion = training::evaluate(&service.model().classifier, &dataset);
    let report = ClassificationReport::from_confusion(&confusion);
    println!(
        "Evaluated {} model on {} records{}",
        service.model().classifier.kind(),
        dataset.len(),
        if options.holdout { " (held-out split)" } else { "" }
    );
    println!("Model Accuracy: {:.2}", report.accuracy);
    println!();
    println!("Classification Report:");
    print!("{report}");
    println!();
    print!("{confusion}");
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    dataset: Option<PathBuf>,
    holdout: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--holdout" => options.holdout = true,
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "glyco-eval",
        "",
        "Scores a saved model against a labeled CSV and prints the classification report.",
        "",
        "Usage:",
        "  glyco-eval [--model diabetes_model.json] [--dataset diabetes.csv] [--holdout]",
        "",
        "Options:",
        "  --model <file>         Model artifact (default: diabetes_model.json).",
        "  --dataset <file>       Labeled CSV (default: diabetes.csv).",
        "  --holdout              Score only the held-out split the trainer would use.",
        "  --config <file>        Config file (default: <app dir>/glyco.toml when present).",
    ]
    .join("\n")
}
