//! Gradient-boosted decision stumps for binary classification.
//!
//! A small alternative to the forest behind the same [`Classifier`](crate::ml::Classifier)
//! seam. Each round fits one depth-1 tree to the logistic residuals, with split
//! search over equal-width histogram bins.

mod model;
mod train;

pub use model::{BoostedStumps, Stump, sigmoid};
pub use train::{StumpOptions, train_boosted_stumps};
