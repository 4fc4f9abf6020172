//! Library exports for the command-line tools, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Pipeline configuration loading.
pub mod config;
/// Labeled dataset loading and splitting.
pub mod dataset;
/// Fixed feature layout and schema checks.
pub mod features;
/// Loaded-model prediction service.
pub mod inference;
/// Logging setup helpers.
pub mod logging;
/// Classifier implementations and evaluation metrics.
pub mod ml;
/// Model artifact format.
pub mod model;
/// Prediction labels and results.
pub mod prediction;
/// Form workflow state.
pub mod session;
/// Offline training procedure.
pub mod training;
