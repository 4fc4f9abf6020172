//! Class labels and the result handed to the presentation layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of outcome classes.
pub const CLASS_COUNT: usize = 2;

/// Binary outcome label. The discriminant is the class index used by classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Outcome {
    NotDiabetic = 0,
    Diabetic = 1,
}

impl Outcome {
    pub const ALL: [Outcome; CLASS_COUNT] = [Outcome::NotDiabetic, Outcome::Diabetic];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NotDiabetic),
            1 => Some(Self::Diabetic),
            _ => None,
        }
    }

    /// Stable identifier used in artifacts and reports.
    pub fn class_id(self) -> &'static str {
        match self {
            Self::NotDiabetic => "not_diabetic",
            Self::Diabetic => "diabetic",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDiabetic => f.write_str("Not Diabetic"),
            Self::Diabetic => f.write_str("Diabetic"),
        }
    }
}

impl From<Outcome> for u8 {
    fn from(value: Outcome) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Outcome {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize).ok_or_else(|| format!("invalid outcome label {value}"))
    }
}

/// Predicted label plus one probability per label, indexed by [`Outcome::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Outcome,
    pub probabilities: [f64; CLASS_COUNT],
}

impl PredictionResult {
    /// Build a result from a probability pair, choosing the most likely label.
    ///
    /// Ties resolve to the lower class index.
    pub fn from_probabilities(probabilities: [f64; CLASS_COUNT]) -> Self {
        let label = if probabilities[1] > probabilities[0] {
            Outcome::Diabetic
        } else {
            Outcome::NotDiabetic
        };
        Self {
            label,
            probabilities,
        }
    }

    pub fn probability(&self, outcome: Outcome) -> f64 {
        self.probabilities[outcome.index()]
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Result: {}", self.label)?;
        writeln!(f, "Probability:")?;
        for outcome in Outcome::ALL {
            writeln!(f, "- {}: {:.2}%", outcome, self.probability(outcome) * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_prefer_lower_class() {
        let result = PredictionResult::from_probabilities([0.5, 0.5]);
        assert_eq!(result.label, Outcome::NotDiabetic);
        let result = PredictionResult::from_probabilities([0.25, 0.75]);
        assert_eq!(result.label, Outcome::Diabetic);
    }

    #[test]
    fn outcome_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Outcome::Diabetic).unwrap(), "1");
        let parsed: Outcome = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, Outcome::NotDiabetic);
        assert!(serde_json::from_str::<Outcome>("2").is_err());
    }

    #[test]
    fn display_renders_percentages() {
        let text = PredictionResult::from_probabilities([0.23, 0.77]).to_string();
        assert!(text.contains("Result: Diabetic"));
        assert!(text.contains("- Not Diabetic: 23.00%"));
        assert!(text.contains("- Diabetic: 77.00%"));
    }
}
