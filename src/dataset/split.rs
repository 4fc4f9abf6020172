//! Seeded, stratified train/test partitioning.

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use thiserror::Error;
use tracing::debug;

use super::loader::LabeledDataset;
use crate::prediction::Outcome;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("test fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),
    #[error("split of {total} records leaves an empty {partition} partition")]
    EmptyPartition {
        total: usize,
        partition: &'static str,
    },
}

/// Train and held-out partitions.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: LabeledDataset,
    pub test: LabeledDataset,
}

/// Split `dataset` so both partitions keep the class balance of the whole.
///
/// Each class is shuffled with a generator seeded from `seed`, and
/// `round(class_size * test_fraction)` of its records go to the test partition.
/// Rows keep their original relative order inside each partition.
pub fn stratified_split(
    dataset: &LabeledDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, SplitError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(dataset.len());
    let mut test_idx = Vec::new();

    for outcome in Outcome::ALL {
        let mut members: Vec<usize> = dataset
            .outcomes
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == outcome)
            .map(|(idx, _)| idx)
            .collect();
        members.shuffle(&mut rng);
        let test_n = ((members.len() as f64) * test_fraction).round() as usize;
        debug!(
            "Class {}: {} train, {} test",
            outcome.class_id(),
            members.len() - test_n,
            test_n
        );
        test_idx.extend_from_slice(&members[..test_n]);
        train_idx.extend_from_slice(&members[test_n..]);
    }

    if train_idx.is_empty() {
        return Err(SplitError::EmptyPartition {
            total: dataset.len(),
            partition: "train",
        });
    }
    if test_idx.is_empty() {
        return Err(SplitError::EmptyPartition {
            total: dataset.len(),
            partition: "test",
        });
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();
    Ok(TrainTestSplit {
        train: dataset.select(&train_idx),
        test: dataset.select(&test_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn imbalanced(n: usize, positives_every: usize) -> LabeledDataset {
        let mut dataset = LabeledDataset::default();
        for i in 0..n {
            dataset.records.push(FeatureVector {
                glucose: i as i32,
                ..FeatureVector::default()
            });
            dataset.outcomes.push(if i % positives_every == 0 {
                Outcome::Diabetic
            } else {
                Outcome::NotDiabetic
            });
        }
        dataset
    }

    #[test]
    fn partitions_preserve_class_ratio() {
        let dataset = imbalanced(768, 3);
        let split = stratified_split(&dataset, 0.2, 42).unwrap();
        assert_eq!(split.train.len() + split.test.len(), dataset.len());

        let full = dataset.positive_ratio();
        let train_tolerance = 1.0 / split.train.len() as f64;
        let test_tolerance = 1.0 / split.test.len() as f64;
        assert!((split.train.positive_ratio() - full).abs() < train_tolerance);
        assert!((split.test.positive_ratio() - full).abs() < test_tolerance);
    }

    #[test]
    fn test_partition_is_about_a_fifth() {
        let dataset = imbalanced(100, 4);
        let split = stratified_split(&dataset, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.test.class_counts(), [15, 5]);
    }

    #[test]
    fn same_seed_gives_same_partitions() {
        let dataset = imbalanced(200, 3);
        let a = stratified_split(&dataset, 0.2, 7).unwrap();
        let b = stratified_split(&dataset, 0.2, 7).unwrap();
        assert_eq!(a.test.records, b.test.records);
        let c = stratified_split(&dataset, 0.2, 8).unwrap();
        assert_ne!(a.test.records, c.test.records);
    }

    #[test]
    fn partitions_are_disjoint() {
        let dataset = imbalanced(50, 2);
        let split = stratified_split(&dataset, 0.3, 1).unwrap();
        for record in &split.test.records {
            assert!(!split.train.records.contains(record));
        }
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        let dataset = imbalanced(10, 2);
        assert_eq!(
            stratified_split(&dataset, 1.0, 0).unwrap_err(),
            SplitError::InvalidFraction(1.0)
        );
        assert!(stratified_split(&dataset, 0.0, 0).is_err());
    }

    #[test]
    fn tiny_dataset_reports_empty_partition() {
        let dataset = imbalanced(2, 2);
        let err = stratified_split(&dataset, 0.2, 0).unwrap_err();
        assert!(matches!(
            err,
            SplitError::EmptyPartition {
                partition: "test",
                ..
            }
        ));
    }
}
