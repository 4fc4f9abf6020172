use linfa::prelude::Predict;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::ml::classifier::{Classifier, FitError, TrainSet};
use crate::prediction::CLASS_COUNT;

use super::train::{ForestOptions, train_random_forest};

/// Fitted ensemble plus the hyperparameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Number of trees requested at fit time.
    pub n_trees: usize,
    /// Seed for bootstrap sampling.
    pub seed: u64,
    /// Depth limit per tree, `None` for fully grown trees.
    pub max_depth: Option<usize>,
    /// Number of features per row.
    pub n_features: usize,
    pub trees: Vec<DecisionTree<f64, usize>>,
}

impl RandomForest {
    /// Validate structural invariants of the ensemble.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("Forest contains no trees".to_string());
        }
        if self.trees.len() != self.n_trees {
            return Err(format!(
                "Forest has {} trees but n_trees is {}",
                self.trees.len(),
                self.n_trees
            ));
        }
        if self.n_features == 0 {
            return Err("Forest expects zero features".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if let Some(feature) = tree
                .features()
                .into_iter()
                .find(|&feature| feature >= self.n_features)
            {
                return Err(format!(
                    "Tree {tree_idx} splits on feature {feature} but the forest has {} features",
                    self.n_features
                ));
            }
        }
        Ok(())
    }

    /// Count of trees voting for each class, per row.
    fn votes(&self, records: &ArrayView2<'_, f64>) -> Array2<u32> {
        let mut votes = Array2::zeros((records.nrows(), CLASS_COUNT));
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(records);
            for (row_idx, &class_idx) in predicted.iter().enumerate() {
                if class_idx < CLASS_COUNT {
                    votes[[row_idx, class_idx]] += 1;
                }
            }
        }
        votes
    }

    fn votes_to_proba(&self, negative: u32, positive: u32) -> [f64; CLASS_COUNT] {
        let total = negative + positive;
        if total == 0 {
            return [1.0 / CLASS_COUNT as f64; CLASS_COUNT];
        }
        let positive = f64::from(positive) / f64::from(total);
        [1.0 - positive, positive]
    }
}

impl Classifier for RandomForest {
    type Options = ForestOptions;

    fn fit(data: &TrainSet, options: &Self::Options) -> Result<Self, FitError> {
        train_random_forest(data, options)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> [f64; CLASS_COUNT] {
        let Ok(view) = ArrayView2::from_shape((1, row.len()), row) else {
            return [1.0 / CLASS_COUNT as f64; CLASS_COUNT];
        };
        let votes = self.votes(&view);
        self.votes_to_proba(votes[[0, 0]], votes[[0, 1]])
    }

    fn predict_proba_batch(&self, records: ArrayView2<'_, f64>) -> Array2<f64> {
        let votes = self.votes(&records);
        let mut out = Array2::zeros((records.nrows(), CLASS_COUNT));
        for row_idx in 0..records.nrows() {
            let proba = self.votes_to_proba(votes[[row_idx, 0]], votes[[row_idx, 1]]);
            out[[row_idx, 0]] = proba[0];
            out[[row_idx, 1]] = proba[1];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> TrainSet {
        TrainSet {
            records: array![
                [0.0, 1.0],
                [1.0, 1.0],
                [2.0, 0.0],
                [3.0, 1.0],
                [10.0, 0.0],
                [11.0, 1.0],
                [12.0, 0.0],
                [13.0, 1.0],
            ],
            targets: array![0, 0, 0, 0, 1, 1, 1, 1],
        }
    }

    fn options(n_trees: usize) -> ForestOptions {
        ForestOptions {
            n_trees,
            seed: 42,
            max_depth: None,
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let forest = RandomForest::fit(&separable(), &options(25)).unwrap();
        for row in [[0.5, 1.0], [6.5, 0.0], [12.5, 1.0], [-100.0, 0.0]] {
            let proba = forest.predict_proba(&row);
            assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn batch_matches_single_row() {
        let data = separable();
        let forest = RandomForest::fit(&data, &options(15)).unwrap();
        let batch = forest.predict_proba_batch(data.records.view());
        for (row_idx, row) in data.records.outer_iter().enumerate() {
            let single = forest.predict_proba(row.as_slice().unwrap());
            assert_eq!(batch[[row_idx, 0]], single[0]);
            assert_eq!(batch[[row_idx, 1]], single[1]);
        }
    }

    #[test]
    fn validate_flags_tree_count_mismatch() {
        let mut forest = RandomForest::fit(&separable(), &options(3)).unwrap();
        assert!(forest.validate().is_ok());
        forest.n_trees = 4;
        assert!(forest.validate().is_err());
        forest.trees.clear();
        assert!(forest.validate().is_err());
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let forest = RandomForest::fit(&separable(), &options(10)).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        for row in [[0.0, 0.0], [5.0, 1.0], [7.0, 0.0], [20.0, 1.0]] {
            assert_eq!(forest.predict_proba(&row), restored.predict_proba(&row));
        }
    }
}
