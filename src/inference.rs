//! Inference service: a loaded model answering prediction requests.
//!
//! A process moves from uninitialized to ready exactly once, when the artifact
//! loads. The loaded model is read-only afterwards, so the shared instance is
//! handed out as a plain `&'static` reference.

use std::path::Path;
use std::sync::OnceLock;

use ndarray::Array2;
use tracing::{info, warn};

use crate::features::{FEATURE_COUNT, FeatureVector, SchemaMismatchError};
use crate::ml::classifier::Classifier;
use crate::model::{ModelLoadError, TrainedModel};
use crate::prediction::PredictionResult;

static SHARED: OnceLock<InferenceService> = OnceLock::new();

/// Lifecycle of the process-wide service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Ready,
}

/// Prediction front end over a validated [`TrainedModel`].
#[derive(Debug, Clone)]
pub struct InferenceService {
    model: TrainedModel,
}

impl InferenceService {
    /// Load and validate the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let model = TrainedModel::load_json(path)?;
        Ok(Self { model })
    }

    /// Wrap an in-memory model after validating it.
    pub fn from_model(model: TrainedModel) -> Result<Self, ModelLoadError> {
        model.validate()?;
        Ok(Self { model })
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Predict the outcome for one record. Field ranges are not checked.
    pub fn predict(&self, features: &FeatureVector) -> PredictionResult {
        PredictionResult::from_probabilities(
            self.model.classifier.predict_proba(&features.to_row()),
        )
    }

    /// Predict from a raw row in canonical feature order.
    pub fn predict_row(&self, row: &[f64]) -> Result<PredictionResult, SchemaMismatchError> {
        self.model.schema.check_row(row)?;
        Ok(PredictionResult::from_probabilities(
            self.model.classifier.predict_proba(row),
        ))
    }

    /// Predict many records in one pass.
    pub fn predict_batch(&self, batch: &[FeatureVector]) -> Vec<PredictionResult> {
        let rows: Vec<[f64; FEATURE_COUNT]> = batch.iter().map(FeatureVector::to_row).collect();
        let records = Array2::from_shape_fn((rows.len(), FEATURE_COUNT), |(i, j)| rows[i][j]);
        self.model
            .classifier
            .predict_proba_batch(records.view())
            .rows()
            .into_iter()
            .map(|proba| PredictionResult::from_probabilities([proba[0], proba[1]]))
            .collect()
    }
}

/// Log a warning naming every field of `features` outside its observed range.
///
/// Returns the offending field names; the record is still usable for prediction.
pub fn warn_out_of_range(features: &FeatureVector) -> Vec<&'static str> {
    let fields = features.out_of_range_fields();
    if !fields.is_empty() {
        warn!(
            "Input outside observed ranges ({}); prediction reliability is unspecified",
            fields.join(", ")
        );
    }
    fields
}

/// Load the process-wide service from `path`.
///
/// The first successful call wins; later calls return the already loaded
/// service without touching `path`.
pub fn init_shared(path: &Path) -> Result<&'static InferenceService, ModelLoadError> {
    if let Some(service) = SHARED.get() {
        return Ok(service);
    }
    let service = InferenceService::load(path)?;
    info!("Inference service ready");
    Ok(SHARED.get_or_init(|| service))
}

/// The process-wide service, once [`init_shared`] has succeeded.
pub fn shared() -> Option<&'static InferenceService> {
    SHARED.get()
}

pub fn state() -> ServiceState {
    if SHARED.get().is_some() {
        ServiceState::Ready
    } else {
        ServiceState::Uninitialized
    }
}

#[cfg(test)]
pub(crate) fn test_service() -> InferenceService {
    use crate::ml::classifier::TrainSet;
    use crate::ml::gbdt_stump::StumpOptions;
    use crate::model::{ClassifierModel, ModelOptions};
    use ndarray::Array1;

    let mut records = Array2::zeros((40, FEATURE_COUNT));
    let mut targets = Array1::zeros(40);
    for i in 0..40 {
        let positive = i % 2 == 0;
        records[[i, 1]] = (if positive { 165.0 } else { 90.0 }) + (i % 7) as f64;
        records[[i, 7]] = 20.0 + i as f64;
        targets[i] = usize::from(positive);
    }
    let classifier = ClassifierModel::fit(
        &TrainSet { records, targets },
        &ModelOptions::GbdtStump(StumpOptions {
            rounds: 30,
            ..StumpOptions::default()
        }),
    )
    .unwrap();
    InferenceService::from_model(TrainedModel::new(classifier)).unwrap()
}
