//! Machine learning building blocks for training and inference.
//!
//! Every model sits behind [`Classifier`] so the pipeline does not depend on a
//! concrete algorithm. The forest is the default; boosted stumps are a lighter
//! alternative selectable from configuration.

pub mod classifier;
pub mod forest;
pub mod gbdt_stump;
pub mod metrics;

pub use classifier::{Classifier, FitError, TrainSet};
