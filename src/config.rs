//! Pipeline configuration loaded from `glyco.toml`.
//!
//! Config keys (TOML): `paths.dataset`, `paths.model`, `training.*`,
//! `training.gbdt_stump.*`, `inference.warn_out_of_range`. Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app_dirs;
use crate::ml::forest::ForestOptions;
use crate::ml::gbdt_stump::StumpOptions;
use crate::model::{DEFAULT_MODEL_FILE, ModelOptions};

/// Default filename used to store the pipeline configuration.
pub const CONFIG_FILE_NAME: &str = "glyco.toml";
/// Well-known training dataset filename, relative to the working directory.
pub const DEFAULT_DATASET_FILE: &str = "diabetes.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to resolve config directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
}

/// Aggregate pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
}

/// Locations of the training data and the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_dataset_path")]
    pub dataset: PathBuf,
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            dataset: default_dataset_path(),
            model: default_model_path(),
        }
    }
}

/// Which learning algorithm the training procedure fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    RandomForest,
    GbdtStump,
}

/// Training procedure hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default)]
    pub classifier: ClassifierKind,
    /// Number of trees in the forest.
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Seed shared by the split and the bootstrap sampler.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Share of each class held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Depth limit per tree; 0 grows trees until leaves are pure.
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default)]
    pub gbdt_stump: StumpSettings,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            n_trees: default_n_trees(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            max_depth: 0,
            gbdt_stump: StumpSettings::default(),
        }
    }
}

impl TrainingSettings {
    /// Algorithm options derived from these settings.
    pub fn model_options(&self) -> ModelOptions {
        match self.classifier {
            ClassifierKind::RandomForest => ModelOptions::RandomForest(ForestOptions {
                n_trees: self.n_trees,
                seed: self.seed,
                max_depth: (self.max_depth > 0).then_some(self.max_depth),
            }),
            ClassifierKind::GbdtStump => ModelOptions::GbdtStump(StumpOptions {
                rounds: self.gbdt_stump.rounds,
                learning_rate: self.gbdt_stump.learning_rate,
                bins: self.gbdt_stump.bins,
            }),
        }
    }
}

/// Boosted-stump hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StumpSettings {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

impl Default for StumpSettings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            learning_rate: default_learning_rate(),
            bins: default_bins(),
        }
    }
}

/// Inference-time preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// Log a warning when a submitted record falls outside the observed ranges.
    #[serde(default = "default_true")]
    pub warn_out_of_range: bool,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            warn_out_of_range: true,
        }
    }
}

impl PipelineConfig {
    /// Clamp values into usable ranges.
    pub fn normalized(mut self) -> Self {
        let training = &mut self.training;
        training.n_trees = training.n_trees.max(1);
        if !(training.test_fraction > 0.0 && training.test_fraction < 1.0) {
            training.test_fraction = default_test_fraction();
        }
        training.gbdt_stump.rounds = training.gbdt_stump.rounds.max(1);
        training.gbdt_stump.bins = training.gbdt_stump.bins.clamp(2, 256);
        if !(training.gbdt_stump.learning_rate > 0.0) {
            training.gbdt_stump.learning_rate = default_learning_rate();
        }
        self
    }
}

/// Path of the config file inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load an explicit config file, or the one in the application directory when
/// present, falling back to defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    let path = config_path()?;
    if path.is_file() {
        load_from(&path)
    } else {
        debug!("No config at {}; using defaults", path.display());
        Ok(PipelineConfig::default())
    }
}

/// Load and normalize a config file.
pub fn load_from(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<PipelineConfig>(&text)
        .map(PipelineConfig::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_FILE)
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_FILE)
}

fn default_n_trees() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_rounds() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_bins() -> usize {
    32
}

fn default_true() -> bool {
    true
}
