//! Bootstrap-aggregated decision-tree ensemble.
//!
//! Tree construction is delegated to `linfa-trees`; this module owns the bagging:
//! - One seeded bootstrap sample per tree, drawn with replacement.
//! - Class probabilities are the share of trees voting for each class.
//! - Trees serialize with serde so the whole ensemble round-trips through JSON.

mod model;
mod train;

pub use model::RandomForest;
pub use train::{ForestOptions, train_random_forest};
