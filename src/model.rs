//! Durable model artifact: the fitted classifier plus the schema it was fitted on.
//!
//! Artifacts are JSON. Saving writes to a temporary file next to the target and
//! renames it into place, so a reader never observes a half-written model.

use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::features::{FeatureSchema, SchemaMismatchError};
use crate::ml::classifier::{Classifier, FitError, TrainSet};
use crate::ml::forest::{ForestOptions, RandomForest};
use crate::ml::gbdt_stump::{BoostedStumps, StumpOptions};
use crate::prediction::{CLASS_COUNT, Outcome};

/// Artifact format version written by this build.
pub const MODEL_VERSION: i64 = 1;

/// Well-known artifact filename, relative to the working directory.
pub const DEFAULT_MODEL_FILE: &str = "diabetes_model.json";

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt model artifact {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported model_version {0} (expected {expected})", expected = MODEL_VERSION)]
    UnsupportedVersion(i64),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
    #[error("model schema does not match the feature layout: {0}")]
    Schema(#[from] SchemaMismatchError),
}

#[derive(Debug, Error)]
pub enum ModelSaveError {
    #[error("failed to prepare model directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Hyperparameters for whichever algorithm is being fitted.
#[derive(Debug, Clone)]
pub enum ModelOptions {
    RandomForest(ForestOptions),
    GbdtStump(StumpOptions),
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self::RandomForest(ForestOptions::default())
    }
}

/// Fitted classifier, tagged by algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierModel {
    RandomForest(RandomForest),
    GbdtStump(BoostedStumps),
}

impl ClassifierModel {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::GbdtStump(_) => "gbdt_stump",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::RandomForest(model) => model.validate(),
            Self::GbdtStump(model) => model.validate(),
        }
    }
}

impl Classifier for ClassifierModel {
    type Options = ModelOptions;

    fn fit(data: &TrainSet, options: &Self::Options) -> Result<Self, FitError> {
        match options {
            ModelOptions::RandomForest(options) => {
                RandomForest::fit(data, options).map(Self::RandomForest)
            }
            ModelOptions::GbdtStump(options) => {
                BoostedStumps::fit(data, options).map(Self::GbdtStump)
            }
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(model) => model.n_features(),
            Self::GbdtStump(model) => model.n_features(),
        }
    }

    fn predict_proba(&self, row: &[f64]) -> [f64; CLASS_COUNT] {
        match self {
            Self::RandomForest(model) => model.predict_proba(row),
            Self::GbdtStump(model) => model.predict_proba(row),
        }
    }

    fn predict_proba_batch(&self, records: ArrayView2<'_, f64>) -> Array2<f64> {
        match self {
            Self::RandomForest(model) => model.predict_proba_batch(records),
            Self::GbdtStump(model) => model.predict_proba_batch(records),
        }
    }
}

/// Serialized artifact shared by training and inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Artifact format version.
    pub model_version: i64,
    /// Feature order the classifier was fitted with.
    pub schema: FeatureSchema,
    /// Class identifiers, indexed by class index.
    pub classes: Vec<String>,
    pub classifier: ClassifierModel,
}

impl TrainedModel {
    /// Wrap a freshly fitted classifier with the canonical schema.
    pub fn new(classifier: ClassifierModel) -> Self {
        Self {
            model_version: MODEL_VERSION,
            schema: FeatureSchema::canonical(),
            classes: Outcome::ALL
                .iter()
                .map(|outcome| outcome.class_id().to_string())
                .collect(),
            classifier,
        }
    }

    /// Validate structural invariants and compatibility with the canonical schema.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.model_version != MODEL_VERSION {
            return Err(ModelLoadError::UnsupportedVersion(self.model_version));
        }
        FeatureSchema::canonical().check(&self.schema.names)?;
        if self.classes.len() != CLASS_COUNT {
            return Err(ModelLoadError::Invalid(format!(
                "expected {CLASS_COUNT} classes, found {}",
                self.classes.len()
            )));
        }
        if self.classifier.n_features() != self.schema.len() {
            return Err(ModelLoadError::Schema(SchemaMismatchError::FeatureCount {
                expected: self.schema.len(),
                actual: self.classifier.n_features(),
            }));
        }
        self.classifier.validate().map_err(ModelLoadError::Invalid)
    }

    /// Load and validate an artifact.
    pub fn load_json(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            return Err(ModelLoadError::Missing(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| ModelLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate()?;
        info!(
            "Loaded {} model from {}",
            model.classifier.kind(),
            path.display()
        );
        Ok(model)
    }

    /// Write the artifact, replacing any existing file at `path`.
    pub fn save_json(&self, path: &Path) -> Result<(), ModelSaveError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| ModelSaveError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let bytes = serde_json::to_vec(self)?;
        let write_err = |source: std::io::Error| ModelSaveError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".glyco_model")
            .tempfile_in(&dir)
            .map_err(write_err)?;
        temp.write_all(&bytes).map_err(write_err)?;
        temp.persist(path).map_err(|err| write_err(err.error))?;
        info!(
            "Saved {} model ({} bytes) to {}",
            self.classifier.kind(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}
