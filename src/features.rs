//! Fixed-shape patient record and the column schema the classifier was trained on.
//!
//! The classifier only sees positional rows, so the canonical column order lives
//! here and every conversion between named and positional form goes through it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of measurements in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 8;

/// Canonical column order used for training and inference.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Name of the label column in training data.
pub const OUTCOME_COLUMN: &str = "Outcome";

/// Raised when a positional row or a named column set does not line up with
/// the canonical feature order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaMismatchError {
    /// Row or header carries a different number of features.
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    /// A column is present but not where the model expects it.
    #[error("feature {position} is {actual:?}, expected {expected:?}")]
    FeatureOrder {
        position: usize,
        expected: String,
        actual: String,
    },
}

/// One patient record. Field order matches [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Pregnancies")]
    pub pregnancies: i32,
    /// Plasma glucose, mg/dL.
    #[serde(rename = "Glucose")]
    pub glucose: i32,
    /// Diastolic blood pressure, mmHg.
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: i32,
    /// Triceps skin fold thickness, mm.
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: i32,
    /// Two-hour serum insulin, mu U/mL.
    #[serde(rename = "Insulin")]
    pub insulin: i32,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree: f64,
    #[serde(rename = "Age")]
    pub age: i32,
}

impl FeatureVector {
    /// Positional row in canonical order.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.pregnancies),
            f64::from(self.glucose),
            f64::from(self.blood_pressure),
            f64::from(self.skin_thickness),
            f64::from(self.insulin),
            self.bmi,
            self.diabetes_pedigree,
            f64::from(self.age),
        ]
    }

    /// Rebuild a record from a positional row.
    pub fn from_row(row: &[f64]) -> Result<Self, SchemaMismatchError> {
        let row: [f64; FEATURE_COUNT] =
            row.try_into().map_err(|_| SchemaMismatchError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: row.len(),
            })?;
        Ok(Self::from_array(row))
    }

    /// Rebuild a record from a canonical-order array.
    ///
    /// Integer-valued columns are rounded; the dataset stores them as whole numbers.
    pub fn from_array(row: [f64; FEATURE_COUNT]) -> Self {
        Self {
            pregnancies: row[0].round() as i32,
            glucose: row[1].round() as i32,
            blood_pressure: row[2].round() as i32,
            skin_thickness: row[3].round() as i32,
            insulin: row[4].round() as i32,
            bmi: row[5],
            diabetes_pedigree: row[6],
            age: row[7].round() as i32,
        }
    }

    /// Whether `value` can be stored in column `index` exactly as given.
    ///
    /// Every column must be finite; the `i32` columns also need a whole number
    /// that fits the field.
    pub fn accepts(index: usize, value: f64) -> bool {
        let Some(&integral) = INTEGER_COLUMNS.get(index) else {
            return false;
        };
        if !value.is_finite() {
            return false;
        }
        if !integral {
            return true;
        }
        value.fract() == 0.0 && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value)
    }

    /// Names of fields whose value falls outside the observed domain.
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        self.to_row()
            .iter()
            .zip(FIELD_RANGES.iter())
            .filter(|(value, range)| !range.contains(**value))
            .map(|(_, range)| range.name)
            .collect()
    }
}

/// Columns held in `i32` fields of [`FeatureVector`], aligned with [`FEATURE_NAMES`].
pub const INTEGER_COLUMNS: [bool; FEATURE_COUNT] =
    [true, true, true, true, true, false, false, true];

/// Observed domain of one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Observed domains, aligned with [`FEATURE_NAMES`].
pub const FIELD_RANGES: [FieldRange; FEATURE_COUNT] = [
    FieldRange {
        name: "Pregnancies",
        min: 0.0,
        max: 17.0,
    },
    FieldRange {
        name: "Glucose",
        min: 0.0,
        max: 200.0,
    },
    FieldRange {
        name: "BloodPressure",
        min: 0.0,
        max: 140.0,
    },
    FieldRange {
        name: "SkinThickness",
        min: 0.0,
        max: 100.0,
    },
    FieldRange {
        name: "Insulin",
        min: 0.0,
        max: 850.0,
    },
    FieldRange {
        name: "BMI",
        min: 0.0,
        max: 67.1,
    },
    FieldRange {
        name: "DiabetesPedigreeFunction",
        min: 0.0,
        max: 2.5,
    },
    FieldRange {
        name: "Age",
        min: 10.0,
        max: 100.0,
    },
];

/// Ordered feature names a model was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub names: Vec<String>,
}

impl FeatureSchema {
    /// Schema in canonical order.
    pub fn canonical() -> Self {
        Self {
            names: FEATURE_NAMES.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check that `names` matches this schema position by position.
    pub fn check<S: AsRef<str>>(&self, names: &[S]) -> Result<(), SchemaMismatchError> {
        if names.len() != self.names.len() {
            return Err(SchemaMismatchError::FeatureCount {
                expected: self.names.len(),
                actual: names.len(),
            });
        }
        for (position, (expected, actual)) in self.names.iter().zip(names).enumerate() {
            if expected != actual.as_ref() {
                return Err(SchemaMismatchError::FeatureOrder {
                    position,
                    expected: expected.clone(),
                    actual: actual.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check the length of a positional row.
    pub fn check_row(&self, row: &[f64]) -> Result<(), SchemaMismatchError> {
        if row.len() != self.names.len() {
            return Err(SchemaMismatchError::FeatureCount {
                expected: self.names.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_row() -> FeatureVector {
        FeatureVector {
            pregnancies: 6,
            glucose: 148,
            blood_pressure: 72,
            skin_thickness: 35,
            insulin: 0,
            bmi: 33.6,
            diabetes_pedigree: 0.627,
            age: 50,
        }
    }

    #[test]
    fn row_follows_canonical_order() {
        let row = reference_row().to_row();
        assert_eq!(row, [6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]);
        assert_eq!(FeatureVector::from_row(&row).unwrap(), reference_row());
    }

    #[test]
    fn from_row_rejects_wrong_length() {
        let err = FeatureVector::from_row(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatchError::FeatureCount {
                expected: 8,
                actual: 2
            }
        );
    }

    #[test]
    fn schema_detects_swapped_columns() {
        let schema = FeatureSchema::canonical();
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names.swap(1, 2);
        let err = schema.check(&names).unwrap_err();
        assert!(matches!(
            err,
            SchemaMismatchError::FeatureOrder { position: 1, .. }
        ));
        assert!(schema.check(&FEATURE_NAMES).is_ok());
    }

    #[test]
    fn out_of_range_reports_field_names() {
        let mut record = reference_row();
        assert!(record.out_of_range_fields().is_empty());
        record.age = -3;
        record.glucose = 250;
        assert_eq!(record.out_of_range_fields(), vec!["Glucose", "Age"]);
    }

    #[test]
    fn all_zero_record_only_flags_age() {
        assert_eq!(FeatureVector::default().out_of_range_fields(), vec!["Age"]);
    }

    #[test]
    fn integer_columns_match_field_types() {
        let fractional = FeatureVector::from_array([0.25; FEATURE_COUNT]).to_row();
        for (index, integral) in INTEGER_COLUMNS.iter().enumerate() {
            assert_eq!(fractional[index] != 0.25, *integral, "column {index}");
        }
    }

    #[test]
    fn accepts_rejects_non_finite_and_fractional_integers() {
        assert!(FeatureVector::accepts(0, 6.0));
        assert!(!FeatureVector::accepts(0, 6.7));
        assert!(!FeatureVector::accepts(1, f64::NAN));
        assert!(!FeatureVector::accepts(5, f64::INFINITY));
        assert!(!FeatureVector::accepts(6, f64::NEG_INFINITY));
        assert!(FeatureVector::accepts(5, 33.6));
        assert!(!FeatureVector::accepts(7, 1e12));
        assert!(!FeatureVector::accepts(FEATURE_COUNT, 1.0));
    }

    #[test]
    fn serde_uses_column_names() {
        let json = serde_json::to_value(reference_row()).unwrap();
        assert_eq!(json["DiabetesPedigreeFunction"], 0.627);
        assert_eq!(json["Glucose"], 148);
    }
}
