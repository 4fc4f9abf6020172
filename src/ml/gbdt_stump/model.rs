use serde::{Deserialize, Serialize};

use crate::ml::classifier::{Classifier, FitError, TrainSet};
use crate::prediction::CLASS_COUNT;

use super::train::{StumpOptions, train_boosted_stumps};

/// Single-split tree used as a weak learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    /// Feature index used for the split.
    pub feature_index: usize,
    /// Threshold in feature units.
    pub threshold: f64,
    /// Prediction for `feature <= threshold`.
    pub left_value: f64,
    /// Prediction for `feature > threshold`.
    pub right_value: f64,
}

impl Stump {
    pub fn predict(&self, features: &[f64]) -> f64 {
        let value = features.get(self.feature_index).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Boosted stump ensemble scoring the log-odds of the diabetic class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedStumps {
    /// Number of features per row.
    pub n_features: usize,
    /// Shrinkage applied to each stump.
    pub learning_rate: f64,
    /// Number of histogram bins used during split search.
    pub bins: usize,
    /// Log-odds of the training prior.
    pub init_raw: f64,
    pub stumps: Vec<Stump>,
}

impl BoostedStumps {
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("Model expects zero features".to_string());
        }
        if !self.init_raw.is_finite() || !self.learning_rate.is_finite() {
            return Err("Model has non-finite parameters".to_string());
        }
        if let Some(stump) = self
            .stumps
            .iter()
            .find(|stump| stump.feature_index >= self.n_features)
        {
            return Err(format!(
                "Stump splits on feature {} but the model has {} features",
                stump.feature_index, self.n_features
            ));
        }
        Ok(())
    }

    /// Raw log-odds score for a row.
    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        self.stumps.iter().fold(self.init_raw, |raw, stump| {
            raw + self.learning_rate * stump.predict(features)
        })
    }
}

impl Classifier for BoostedStumps {
    type Options = StumpOptions;

    fn fit(data: &TrainSet, options: &Self::Options) -> Result<Self, FitError> {
        train_boosted_stumps(data, options)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> [f64; CLASS_COUNT] {
        let positive = sigmoid(self.predict_raw(row));
        [1.0 - positive, positive]
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(raw: f64) -> f64 {
    if raw >= 0.0 {
        1.0 / (1.0 + (-raw).exp())
    } else {
        let e = raw.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Outcome;

    #[test]
    fn stump_predict_branches() {
        let stump = Stump {
            feature_index: 0,
            threshold: 0.5,
            left_value: -1.0,
            right_value: 2.0,
        };
        assert_eq!(stump.predict(&[0.0]), -1.0);
        assert_eq!(stump.predict(&[0.5]), -1.0);
        assert_eq!(stump.predict(&[0.6]), 2.0);
    }

    #[test]
    fn sigmoid_is_symmetric_and_bounded() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn model_predicts_from_raw_score() {
        let model = BoostedStumps {
            n_features: 2,
            learning_rate: 1.0,
            bins: 32,
            init_raw: 0.0,
            stumps: vec![Stump {
                feature_index: 1,
                threshold: 0.0,
                left_value: -2.0,
                right_value: 2.0,
            }],
        };
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&[0.0, -1.0]), Outcome::NotDiabetic);
        assert_eq!(model.predict(&[0.0, 1.0]), Outcome::Diabetic);
        let proba = model.predict_proba(&[0.0, 1.0]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_out_of_range_feature() {
        let model = BoostedStumps {
            n_features: 1,
            learning_rate: 0.1,
            bins: 32,
            init_raw: 0.0,
            stumps: vec![Stump {
                feature_index: 3,
                threshold: 0.0,
                left_value: 0.0,
                right_value: 0.0,
            }],
        };
        assert!(model.validate().is_err());
    }
}
