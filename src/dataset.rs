//! Labeled training data: CSV loading and train/test partitioning.

pub mod loader;
pub mod split;

pub use loader::{DataLoadError, LabeledDataset, load_csv, read_csv};
pub use split::{SplitError, TrainTestSplit, stratified_split};
