use ndarray::{Array2, ArrayView1, Axis};
use tracing::info;

use super::model::{BoostedStumps, Stump, sigmoid};
use crate::ml::classifier::{FitError, TrainSet};

/// Training hyperparameters for stump boosting.
#[derive(Debug, Clone)]
pub struct StumpOptions {
    /// Number of boosting rounds.
    pub rounds: usize,
    /// Learning rate applied per round.
    pub learning_rate: f64,
    /// Number of bins used for split search.
    pub bins: usize,
}

impl Default for StumpOptions {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            bins: 32,
        }
    }
}

/// Fit a binary stump ensemble with logistic-loss gradient boosting.
pub fn train_boosted_stumps(
    data: &TrainSet,
    options: &StumpOptions,
) -> Result<BoostedStumps, FitError> {
    data.validate()?;
    if !(options.learning_rate > 0.0) {
        return Err(FitError::InvalidParams(format!(
            "learning_rate must be positive, got {}",
            options.learning_rate
        )));
    }
    let bins = options.bins.clamp(2, 256);
    let n = data.n_samples();
    let x = &data.records;
    let y: Vec<f64> = data.targets.iter().map(|&t| if t == 1 { 1.0 } else { 0.0 }).collect();

    let (mins, maxs) = compute_feature_min_max(x);
    let binned = bin_features(x, &mins, &maxs, bins);

    let prior = (y.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
    let init_raw = (prior / (1.0 - prior)).ln();
    let mut raw = vec![init_raw; n];

    let mut stumps = Vec::with_capacity(options.rounds);
    for _round in 0..options.rounds {
        let residuals: Vec<f64> = y
            .iter()
            .zip(&raw)
            .map(|(&target, &score)| target - sigmoid(score))
            .collect();
        let stump = fit_best_stump(&binned, x, &mins, &maxs, bins, &residuals);
        for (score, row) in raw.iter_mut().zip(x.outer_iter()) {
            *score += options.learning_rate * predict_row(&stump, row);
        }
        stumps.push(stump);
    }
    info!("Boosted {} stumps on {} samples", stumps.len(), n);

    Ok(BoostedStumps {
        n_features: data.n_features(),
        learning_rate: options.learning_rate,
        bins,
        init_raw,
        stumps,
    })
}

fn predict_row(stump: &Stump, row: ArrayView1<'_, f64>) -> f64 {
    let value = row.get(stump.feature_index).copied().unwrap_or(0.0);
    if value <= stump.threshold {
        stump.left_value
    } else {
        stump.right_value
    }
}

fn compute_feature_min_max(x: &Array2<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut mins = vec![f64::INFINITY; x.ncols()];
    let mut maxs = vec![f64::NEG_INFINITY; x.ncols()];
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        for &v in column.iter().filter(|v| v.is_finite()) {
            mins[j] = mins[j].min(v);
            maxs[j] = maxs[j].max(v);
        }
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

/// Row-major bin indices, shape `[n_samples, n_features]`.
fn bin_features(x: &Array2<f64>, mins: &[f64], maxs: &[f64], bins: usize) -> Array2<u8> {
    let top = (bins - 1) as f64;
    Array2::from_shape_fn(x.dim(), |(i, j)| {
        let (min, max) = (mins[j], maxs[j]);
        let t = ((x[[i, j]] - min) / (max - min)).clamp(0.0, 1.0);
        if t.is_nan() {
            0
        } else {
            (t * top).round() as u8
        }
    })
}

fn fit_best_stump(
    binned: &Array2<u8>,
    x: &Array2<f64>,
    mins: &[f64],
    maxs: &[f64],
    bins: usize,
    residuals: &[f64],
) -> Stump {
    let mut best = BestSplit::default();
    for feature_idx in 0..mins.len() {
        let split = best_split_for_feature(binned, residuals, feature_idx, bins);
        if split.score < best.score {
            best = split;
        }
    }

    let feature_idx = best.feature_index;
    let threshold = threshold_for_bin(mins[feature_idx], maxs[feature_idx], best.split_bin, bins);
    let (left_value, right_value) = leaf_means(x, residuals, feature_idx, threshold);
    Stump {
        feature_index: feature_idx,
        threshold,
        left_value,
        right_value,
    }
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
}

impl Default for BestSplit {
    fn default() -> Self {
        Self {
            score: f64::INFINITY,
            feature_index: 0,
            split_bin: 0,
        }
    }
}

/// Lowest sum of squared errors over all bin boundaries of one feature.
fn best_split_for_feature(
    binned: &Array2<u8>,
    residuals: &[f64],
    feature_idx: usize,
    bins: usize,
) -> BestSplit {
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f64; bins];
    let mut sums_sq = vec![0f64; bins];
    for (&b, &r) in binned.column(feature_idx).iter().zip(residuals) {
        let b = b as usize;
        counts[b] += 1;
        sums[b] += r;
        sums_sq[b] += r * r;
    }
    let total_count: u32 = counts.iter().sum();
    let total_sum: f64 = sums.iter().sum();
    let total_sum_sq: f64 = sums_sq.iter().sum();

    let mut best = BestSplit {
        feature_index: feature_idx,
        ..BestSplit::default()
    };
    let mut left_count = 0u32;
    let mut left_sum = 0f64;
    let mut left_sum_sq = 0f64;
    for split_bin in 0..(bins - 1) {
        left_count += counts[split_bin];
        left_sum += sums[split_bin];
        left_sum_sq += sums_sq[split_bin];
        let right_count = total_count - left_count;
        if left_count == 0 || right_count == 0 {
            continue;
        }
        let right_sum = total_sum - left_sum;
        let right_sum_sq = total_sum_sq - left_sum_sq;
        let left_sse = left_sum_sq - (left_sum * left_sum) / f64::from(left_count);
        let right_sse = right_sum_sq - (right_sum * right_sum) / f64::from(right_count);
        let score = left_sse + right_sse;
        if score < best.score {
            best.score = score;
            best.split_bin = split_bin;
        }
    }
    best
}

/// Upper edge of `split_bin`, halfway to the next bin centre.
fn threshold_for_bin(min: f64, max: f64, split_bin: usize, bins: usize) -> f64 {
    let t = (split_bin as f64 + 0.5) / (bins - 1) as f64;
    min + t * (max - min)
}

fn leaf_means(
    x: &Array2<f64>,
    residuals: &[f64],
    feature_idx: usize,
    threshold: f64,
) -> (f64, f64) {
    let (mut left_sum, mut left_count) = (0.0f64, 0u32);
    let (mut right_sum, mut right_count) = (0.0f64, 0u32);
    for (&v, &r) in x.column(feature_idx).iter().zip(residuals) {
        if v <= threshold {
            left_sum += r;
            left_count += 1;
        } else {
            right_sum += r;
            right_count += 1;
        }
    }
    let mean = |sum: f64, count: u32| if count == 0 { 0.0 } else { sum / f64::from(count) };
    (mean(left_sum, left_count), mean(right_sum, right_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::Classifier;
    use crate::prediction::Outcome;
    use ndarray::{Array1, array};

    #[test]
    fn threshold_sits_between_bins() {
        let x = array![[0.0], [10.0]];
        let (mins, maxs) = compute_feature_min_max(&x);
        let binned = bin_features(&x, &mins, &maxs, 11);
        assert_eq!(binned[[0, 0]], 0);
        assert_eq!(binned[[1, 0]], 10);
        assert_eq!(threshold_for_bin(0.0, 10.0, 4, 11), 4.5);
    }

    #[test]
    fn constant_feature_does_not_divide_by_zero() {
        let x = array![[3.0], [3.0], [3.0]];
        let (mins, maxs) = compute_feature_min_max(&x);
        assert_eq!((mins[0], maxs[0]), (3.0, 4.0));
        let binned = bin_features(&x, &mins, &maxs, 8);
        assert!(binned.iter().all(|&b| b == 0));
    }

    #[test]
    fn boosting_separates_two_clusters() {
        let mut records = Array2::zeros((40, 2));
        let mut targets = Array1::zeros(40);
        for i in 0..40 {
            let positive = i % 2 == 1;
            records[[i, 0]] = if positive { 150.0 + i as f64 } else { 80.0 + i as f64 };
            records[[i, 1]] = (i % 5) as f64;
            targets[i] = usize::from(positive);
        }
        let data = TrainSet { records, targets };
        let model = train_boosted_stumps(&data, &StumpOptions {
            rounds: 30,
            learning_rate: 0.3,
            bins: 16,
        })
        .unwrap();
        assert_eq!(model.stumps.len(), 30);
        assert!(model.stumps.iter().all(|stump| stump.feature_index == 0));
        assert_eq!(model.predict(&[90.0, 1.0]), Outcome::NotDiabetic);
        assert_eq!(model.predict(&[180.0, 1.0]), Outcome::Diabetic);
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        let data = TrainSet {
            records: array![[0.0], [1.0]],
            targets: array![0, 1],
        };
        let err = train_boosted_stumps(&data, &StumpOptions {
            learning_rate: 0.0,
            ..StumpOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidParams(_)));
    }
}
