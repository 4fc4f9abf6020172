//! Offline training procedure: dataset in, model artifact out.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::TrainingSettings;
use crate::dataset::{DataLoadError, LabeledDataset, SplitError, load_csv, stratified_split};
use crate::ml::classifier::{Classifier, FitError, TrainSet};
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix};
use crate::model::{ClassifierModel, ModelSaveError, TrainedModel};
use crate::prediction::Outcome;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to load training data: {0}")]
    DataLoad(#[from] DataLoadError),
    #[error("failed to split training data: {0}")]
    Split(#[from] SplitError),
    #[error("failed to fit classifier: {0}")]
    Fit(#[from] FitError),
    #[error("failed to save model: {0}")]
    Save(#[from] ModelSaveError),
}

/// Outcome of one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub classifier_kind: &'static str,
    pub train_size: usize,
    pub test_size: usize,
    pub confusion: ConfusionMatrix,
    /// Held-out evaluation; advisory only.
    pub report: ClassificationReport,
}

/// Fit a model on a labeled dataset and evaluate it on a stratified hold-out.
///
/// Returns the model without saving it.
pub fn fit_and_evaluate(
    dataset: &LabeledDataset,
    settings: &TrainingSettings,
) -> Result<(TrainedModel, usize, usize, ConfusionMatrix), TrainingError> {
    let split = stratified_split(dataset, settings.test_fraction, settings.seed)?;
    info!(
        "Split {} records into {} train / {} test",
        dataset.len(),
        split.train.len(),
        split.test.len()
    );
    let classifier = ClassifierModel::fit(
        &TrainSet::from_dataset(&split.train),
        &settings.model_options(),
    )?;
    let confusion = evaluate(&classifier, &split.test);
    Ok((
        TrainedModel::new(classifier),
        split.train.len(),
        split.test.len(),
        confusion,
    ))
}

/// Tally predictions of `classifier` against the labels of `dataset`.
pub fn evaluate<C: Classifier>(classifier: &C, dataset: &LabeledDataset) -> ConfusionMatrix {
    let mut confusion = ConfusionMatrix::new();
    for (record, &truth) in dataset.records.iter().zip(&dataset.outcomes) {
        confusion.add(truth, classifier.predict(&record.to_row()));
    }
    confusion
}

/// Run the full procedure: load, split, fit, evaluate, and save to `model_path`.
///
/// The artifact is written regardless of the evaluation result and replaces any
/// previous artifact at the same path.
pub fn run(
    dataset_path: &Path,
    model_path: &Path,
    settings: &TrainingSettings,
) -> Result<TrainingReport, TrainingError> {
    let dataset = load_csv(dataset_path)?;
    let (model, train_size, test_size, confusion) = fit_and_evaluate(&dataset, settings)?;
    let report = ClassificationReport::from_confusion(&confusion);
    info!("Held-out accuracy {:.4}", report.accuracy);
    if report.per_class[Outcome::Diabetic.index()].recall == 0.0 {
        warn!("Model never predicts the diabetic class on the held-out set");
    }
    model.save_json(model_path)?;
    Ok(TrainingReport {
        model_path: model_path.to_path_buf(),
        classifier_kind: model.classifier.kind(),
        train_size,
        test_size,
        confusion,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierKind;
    use crate::features::FeatureVector;
    use tempfile::tempdir;

    fn clustered(n: usize) -> LabeledDataset {
        let mut dataset = LabeledDataset::default();
        for i in 0..n {
            let positive = i % 3 == 0;
            dataset.records.push(FeatureVector {
                glucose: if positive { 150 } else { 95 } + (i % 20) as i32,
                bmi: if positive { 35.0 } else { 24.0 },
                age: 20 + (i % 40) as i32,
                ..FeatureVector::default()
            });
            dataset.outcomes.push(if positive {
                Outcome::Diabetic
            } else {
                Outcome::NotDiabetic
            });
        }
        dataset
    }

    #[test]
    fn fit_and_evaluate_reports_hold_out_sizes() {
        let settings = TrainingSettings {
            n_trees: 10,
            ..TrainingSettings::default()
        };
        let (model, train, test, confusion) = fit_and_evaluate(&clustered(100), &settings).unwrap();
        assert_eq!(train + test, 100);
        assert_eq!(confusion.total() as usize, test);
        assert_eq!(model.classifier.kind(), "random_forest");
        assert_eq!(ClassificationReport::from_confusion(&confusion).accuracy, 1.0);
    }

    #[test]
    fn run_writes_artifact_even_for_a_weak_model() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("diabetes.csv");
        let mut text = String::from(
            "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n",
        );
        // Identical features with mixed labels: nothing to learn.
        for i in 0..20 {
            text.push_str(&format!("1,100,70,20,0,25.0,0.5,30,{}\n", i % 2));
        }
        std::fs::write(&csv, text).unwrap();
        let model_path = dir.path().join("model.json");
        let settings = TrainingSettings {
            classifier: ClassifierKind::GbdtStump,
            ..TrainingSettings::default()
        };
        let report = run(&csv, &model_path, &settings).unwrap();
        assert!(model_path.is_file());
        assert_eq!(report.test_size, 4);
        assert_eq!(report.classifier_kind, "gbdt_stump");
    }

    #[test]
    fn missing_dataset_aborts_without_artifact() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let err = run(
            &dir.path().join("missing.csv"),
            &model_path,
            &TrainingSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TrainingError::DataLoad(DataLoadError::Missing(_))));
        assert!(!model_path.exists());
    }
}
