//! CSV loader for labeled training data.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, OUTCOME_COLUMN};
use crate::prediction::Outcome;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("dataset not found: {0}")]
    Missing(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column {0:?}")]
    MissingColumn(String),
    #[error("unexpected column {0:?} (expected the 8 feature columns plus \"Outcome\")")]
    UnexpectedColumn(String),
    #[error("row {row}: invalid value {value:?} in column {column:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: outcome must be 0 or 1, got {value:?}")]
    InvalidOutcome { row: usize, value: String },
    #[error("dataset has no rows")]
    Empty,
}

/// Labeled records in canonical feature order.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub records: Vec<FeatureVector>,
    /// Labels aligned with `records`.
    pub outcomes: Vec<Outcome>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Count of records per class, indexed by [`Outcome::index`].
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for outcome in &self.outcomes {
            counts[outcome.index()] += 1;
        }
        counts
    }

    /// Share of diabetic records, or 0 for an empty dataset.
    pub fn positive_ratio(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.class_counts()[Outcome::Diabetic.index()] as f64 / self.outcomes.len() as f64
    }

    /// Subset by row indices, preserving the order given.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&idx| self.records[idx]).collect(),
            outcomes: indices.iter().map(|&idx| self.outcomes[idx]).collect(),
        }
    }
}

/// Load a labeled CSV with the eight feature columns and an `Outcome` column.
///
/// Columns are located by header name, so their order in the file does not matter,
/// but every feature must be present and nothing else may be.
pub fn load_csv(path: &Path) -> Result<LabeledDataset, DataLoadError> {
    if !path.is_file() {
        return Err(DataLoadError::Missing(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let dataset = read_csv(file)?;
    let [negatives, positives] = dataset.class_counts();
    info!(
        "Loaded {} records from {} ({} diabetic, {} not diabetic)",
        dataset.len(),
        path.display(),
        positives,
        negatives
    );
    Ok(dataset)
}

/// Parse labeled CSV from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<LabeledDataset, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let layout = ColumnLayout::from_headers(reader.headers()?.iter())?;

    let mut dataset = LabeledDataset::default();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row_number = idx + 2;
        let mut row = [0.0f64; FEATURE_COUNT];
        for (index, (slot, &column)) in row.iter_mut().zip(layout.features.iter()).enumerate() {
            let raw = record.get(column).unwrap_or_default();
            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|&value| FeatureVector::accepts(index, value))
                .ok_or_else(|| DataLoadError::InvalidValue {
                    row: row_number,
                    column: FEATURE_NAMES[index].to_string(),
                    value: raw.to_string(),
                })?;
        }
        let raw_outcome = record.get(layout.outcome).unwrap_or_default();
        let outcome = parse_outcome(raw_outcome).ok_or_else(|| DataLoadError::InvalidOutcome {
            row: row_number,
            value: raw_outcome.to_string(),
        })?;
        dataset.records.push(FeatureVector::from_array(row));
        dataset.outcomes.push(outcome);
    }
    if dataset.is_empty() {
        return Err(DataLoadError::Empty);
    }
    Ok(dataset)
}

fn parse_outcome(raw: &str) -> Option<Outcome> {
    match raw.parse::<f64>().ok()? {
        v if v == 0.0 => Some(Outcome::NotDiabetic),
        v if v == 1.0 => Some(Outcome::Diabetic),
        _ => None,
    }
}

/// Position of each canonical column within the file.
struct ColumnLayout {
    features: [usize; FEATURE_COUNT],
    outcome: usize,
}

impl ColumnLayout {
    fn from_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Result<Self, DataLoadError> {
        let mut features = [None; FEATURE_COUNT];
        let mut outcome = None;
        for (column, name) in headers.enumerate() {
            if name == OUTCOME_COLUMN && outcome.is_none() {
                outcome = Some(column);
                continue;
            }
            match FEATURE_NAMES.iter().position(|candidate| *candidate == name) {
                Some(slot) if features[slot].is_none() => features[slot] = Some(column),
                _ => return Err(DataLoadError::UnexpectedColumn(name.to_string())),
            }
        }
        let outcome =
            outcome.ok_or_else(|| DataLoadError::MissingColumn(OUTCOME_COLUMN.to_string()))?;
        let mut resolved = [0usize; FEATURE_COUNT];
        for (slot, column) in features.iter().enumerate() {
            resolved[slot] = column
                .ok_or_else(|| DataLoadError::MissingColumn(FEATURE_NAMES[slot].to_string()))?;
        }
        Ok(Self {
            features: resolved,
            outcome,
        })
    }
}
