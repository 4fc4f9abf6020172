//! Train the diabetes classifier and write the model artifact.

use std::path::PathBuf;

use glyco::config::{self, ClassifierKind};
use glyco::logging;
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
    let mut config =
        config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(dataset) = options.dataset {
        config.paths.dataset = dataset;
    }
    if let Some(out) = options.model_out {
        config.paths.model = out;
    }
    if let Some(n_trees) = options.n_trees {
        config.training.n_trees = n_trees;
    }
    if let Some(seed) = options.seed {
        config.training.seed = seed;
    }
    if let Some(kind) = options.classifier {
        config.training.classifier = kind;
    }
    let config = config.normalized();

    let outcome = training::run(&config.paths.dataset, &config.paths.model, &config.training)
        .map_err(|err| err.to_string())?;

    println!("Model Accuracy: {:.2}", outcome.report.accuracy);
    println!();
    println!("Classification Report:");
    print!("{}", outcome.report);
    println!();
    print!("{}", outcome.confusion);
    println!();
    println!(
        "Saved {} model to {} (train={}, test={})",
        outcome.classifier_kind,
        outcome.model_path.display(),
        outcome.train_size,
        outcome.test_size
    );
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    dataset: Option<PathBuf>,
    model_out: Option<PathBuf>,
    n_trees: Option<usize>,
    seed: Option<u64>,
    classifier: Option<ClassifierKind>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.model_out = Some(PathBuf::from(value));
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                options.n_trees = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--classifier" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--classifier requires a value".to_string())?;
                options.classifier = Some(match value.as_str() {
                    "random_forest" | "forest" => ClassifierKind::RandomForest,
                    "gbdt_stump" | "stumps" => ClassifierKind::GbdtStump,
                    other => return Err(format!("Invalid --classifier value: {other}")),
                });
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "glyco-train",
        "",
        "Fits the diabetes classifier on a labeled CSV, reports held-out metrics,",
        "and writes the model artifact (replacing any previous one).",
        "",
        "Usage:",
        "  glyco-train [--dataset diabetes.csv] [--out diabetes_model.json] [options]",
        "",
        "Options:",
        "  --config <file>        Config file (default: <app dir>/glyco.toml when present).",
        "  --dataset <file>       Training CSV (default: diabetes.csv).",
        "  --out <file>           Output model path (default: diabetes_model.json).",
        "  --trees <n>            Number of trees in the forest (default: 100).",
        "  --seed <n>             Seed for the split and the forest (default: 42).",
        "  --classifier <kind>    random_forest (default) or gbdt_stump.",
    ]
    .join("\n")
}
