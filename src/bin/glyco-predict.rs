//! Predict diabetes risk for one record given on the command line.

use std::path::PathBuf;

use glyco::config;
use glyco::features::FeatureVector;
use glyco::inference;
use glyco::logging;
use glyco::session::Session;

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
    let service = inference::init_shared(&model_path).map_err(|err| err.to_string())?;

    if config.inference.warn_out_of_range {
        inference::warn_out_of_range(&options.features);
    }
    let mut session = Session::new();
    session
        .set_draft(options.features)
        .map_err(|err| err.to_string())?;
    let result = session
        .submit(options.features, service)
        .map_err(|err| err.to_string())?;

    if options.json {
        let json = serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?;
        println!("{json}");
    } else {
        print!("{result}");
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    features: FeatureVector,
    json: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--json" => options.json = true,
            "--config" | "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                let path = Some(PathBuf::from(value));
                if flag == "--config" {
                    options.config = path;
                } else {
                    options.model = path;
                }
            }
            "--pregnancies" | "--glucose" | "--blood-pressure" | "--skin-thickness"
            | "--insulin" | "--age" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                let parsed = value
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid {flag} value: {value}"))?;
                let features = &mut options.features;
                match flag {
                    "--pregnancies" => features.pregnancies = parsed,
                    "--glucose" => features.glucose = parsed,
                    "--blood-pressure" => features.blood_pressure = parsed,
                    "--skin-thickness" => features.skin_thickness = parsed,
                    "--insulin" => features.insulin = parsed,
                    _ => features.age = parsed,
                }
            }
            "--bmi" | "--pedigree" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid {flag} value: {value}"))?;
                if flag == "--bmi" {
                    options.features.bmi = parsed;
                } else {
                    options.features.diabetes_pedigree = parsed;
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "glyco-predict",
        "",
        "Predicts diabetes risk for one patient record. Omitted measurements are 0.",
        "",
        "Usage:",
        "  glyco-predict --glucose 148 --bmi 33.6 --age 50 [options]",
        "",
        "Options:",
        "  --pregnancies <n>      Number of pregnancies.",
        "  --glucose <n>          Plasma glucose concentration.",
        "  --blood-pressure <n>   Diastolic blood pressure (mm Hg).",
        "  --skin-thickness <n>   Triceps skin fold thickness (mm).",
        "  --insulin <n>          2-hour serum insulin.",
        "  --bmi <f64>            Body mass index.",
        "  --pedigree <f64>       Diabetes pedigree function.",
        "  --age <n>              Age in years.",
        "  --model <file>         Model artifact (default: diabetes_model.json).",
        "  --config <file>        Config file (default: <app dir>/glyco.toml when present).",
        "  --json                 Print the result as JSON.",
    ]
    .join("\n")
}
