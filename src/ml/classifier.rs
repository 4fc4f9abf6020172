//! Seam between the pipeline and the concrete learning algorithm.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use thiserror::Error;

use crate::dataset::LabeledDataset;
use crate::features::FEATURE_COUNT;
use crate::prediction::{CLASS_COUNT, Outcome};

#[derive(Debug, Error)]
pub enum FitError {
    #[error("training set is empty")]
    Empty,
    #[error("feature matrix has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("invalid hyperparameter: {0}")]
    InvalidParams(String),
    #[error("tree fitting failed: {0}")]
    Tree(String),
}

/// Feature matrix with aligned class indices, the shape classifiers train on.
#[derive(Debug, Clone)]
pub struct TrainSet {
    /// Shape `[n_samples, n_features]`.
    pub records: Array2<f64>,
    /// Class index per row (see [`Outcome::index`]).
    pub targets: Array1<usize>,
}

impl TrainSet {
    pub fn from_dataset(dataset: &LabeledDataset) -> Self {
        let mut records = Array2::zeros((dataset.len(), FEATURE_COUNT));
        for (mut row, record) in records.axis_iter_mut(Axis(0)).zip(&dataset.records) {
            for (slot, value) in row.iter_mut().zip(record.to_row()) {
                *slot = value;
            }
        }
        let targets = dataset.outcomes.iter().map(|outcome| outcome.index()).collect();
        Self { records, targets }
    }

    pub fn n_samples(&self) -> usize {
        self.records.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.records.ncols()
    }

    pub(crate) fn validate(&self) -> Result<(), FitError> {
        if self.records.nrows() != self.targets.len() {
            return Err(FitError::LengthMismatch {
                rows: self.records.nrows(),
                labels: self.targets.len(),
            });
        }
        if self.records.nrows() == 0 {
            return Err(FitError::Empty);
        }
        Ok(())
    }
}

/// Binary classifier over positional feature rows.
///
/// `predict_proba` returns one probability per class, indexed by class index,
/// summing to 1. Implementations must be deterministic once fitted.
pub trait Classifier: Sized {
    type Options;

    fn fit(data: &TrainSet, options: &Self::Options) -> Result<Self, FitError>;

    /// Number of features each row must carry.
    fn n_features(&self) -> usize;

    fn predict_proba(&self, row: &[f64]) -> [f64; CLASS_COUNT];

    fn predict(&self, row: &[f64]) -> Outcome {
        let proba = self.predict_proba(row);
        if proba[1] > proba[0] {
            Outcome::Diabetic
        } else {
            Outcome::NotDiabetic
        }
    }

    /// Probabilities for every row, shape `[n_rows, CLASS_COUNT]`.
    fn predict_proba_batch(&self, records: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = Array2::zeros((records.nrows(), CLASS_COUNT));
        for (row, mut slot) in records.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            let proba = match row.as_slice() {
                Some(values) => self.predict_proba(values),
                None => self.predict_proba(&row.to_vec()),
            };
            slot[0] = proba[0];
            slot[1] = proba[1];
        }
        out
    }
}
