use std::time::Instant;

use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::model::RandomForest;
use crate::ml::classifier::{FitError, TrainSet};

/// Ensemble hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestOptions {
    /// Number of bootstrap-sampled trees.
    pub n_trees: usize,
    /// Seed for bootstrap sampling.
    pub seed: u64,
    /// Depth limit per tree, `None` to grow until leaves are pure.
    pub max_depth: Option<usize>,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
        }
    }
}

/// Fit `options.n_trees` Gini trees, each on its own bootstrap sample of `data`.
pub fn train_random_forest(
    data: &TrainSet,
    options: &ForestOptions,
) -> Result<RandomForest, FitError> {
    data.validate()?;
    if options.n_trees == 0 {
        return Err(FitError::InvalidParams("n_trees must be at least 1".to_string()));
    }
    if options.max_depth == Some(0) {
        return Err(FitError::InvalidParams("max_depth must be at least 1".to_string()));
    }

    let started = Instant::now();
    let n = data.n_samples();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let params = DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(options.max_depth);

    let mut trees = Vec::with_capacity(options.n_trees);
    for tree_idx in 0..options.n_trees {
        let sample = bootstrap_indices(&mut rng, n);
        let records = data.records.select(Axis(0), &sample);
        let targets = data.targets.select(Axis(0), &sample);
        let bootstrap = Dataset::new(records, targets);
        let tree = params
            .fit(&bootstrap)
            .map_err(|err| FitError::Tree(format!("tree {tree_idx}: {err}")))?;
        trees.push(tree);
    }
    debug!("Bootstrap samples drawn with seed {}", options.seed);
    info!(
        "Fitted {} trees on {} samples in {:.2?}",
        trees.len(),
        n,
        started.elapsed()
    );

    Ok(RandomForest {
        n_trees: options.n_trees,
        seed: options.seed,
        max_depth: options.max_depth,
        n_features: data.n_features(),
        trees,
    })
}

/// Draw `n` row indices uniformly with replacement.
fn bootstrap_indices(rng: &mut StdRng, n: usize) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}
