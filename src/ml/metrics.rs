//! Evaluation metrics for classification models.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::prediction::{CLASS_COUNT, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Confusion matrix for the binary outcome.
pub struct ConfusionMatrix {
    /// `counts[truth][predicted]`.
    pub counts: [[u32; CLASS_COUNT]; CLASS_COUNT],
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self {
            counts: [[0; CLASS_COUNT]; CLASS_COUNT],
        }
    }

    /// Tally aligned truth/prediction pairs.
    pub fn from_pairs(truth: &[Outcome], predicted: &[Outcome]) -> Self {
        let mut cm = Self::new();
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: Outcome, predicted: Outcome) {
        let cell = &mut self.counts[truth.index()][predicted.index()];
        *cell = cell.saturating_add(1);
    }

    pub fn get(&self, truth: Outcome, predicted: Outcome) -> u32 {
        self.counts[truth.index()][predicted.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "confusion matrix (rows=true, cols=pred):")?;
        for truth in Outcome::ALL {
            for predicted in Outcome::ALL {
                write!(f, "{:6}", self.get(truth, predicted))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Precision/recall statistics for a single class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
///
/// Undefined ratios (zero denominators) are reported as 0.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> [PerClassStats; CLASS_COUNT] {
    Outcome::ALL.map(|class| {
        let tp = f64::from(cm.get(class, class));
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for other in Outcome::ALL {
            support = support.saturating_add(cm.get(class, other));
            if other != class {
                fn_ += f64::from(cm.get(class, other));
                fp += f64::from(cm.get(other, class));
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        PerClassStats {
            precision,
            recall,
            f1,
            support,
        }
    })
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u32 = Outcome::ALL.iter().map(|&class| cm.get(class, class)).sum();
    f64::from(correct) / f64::from(total)
}

/// Accuracy plus per-class and averaged precision/recall/F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: [PerClassStats; CLASS_COUNT],
    /// Unweighted mean over classes.
    pub macro_avg: PerClassStats,
    /// Mean over classes weighted by support.
    pub weighted_avg: PerClassStats,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let per_class = precision_recall_by_class(cm);
        let supports = per_class.map(|stats| f64::from(stats.support));
        Self {
            accuracy: accuracy(cm),
            per_class,
            macro_avg: weighted_average(&per_class, [1.0; CLASS_COUNT]),
            weighted_avg: weighted_average(&per_class, supports),
        }
    }
}

fn weighted_average(
    per_class: &[PerClassStats; CLASS_COUNT],
    weights: [f64; CLASS_COUNT],
) -> PerClassStats {
    let total: f64 = weights.iter().sum();
    let mean = |field: fn(&PerClassStats) -> f64| {
        if total == 0.0 {
            return 0.0;
        }
        per_class
            .iter()
            .zip(weights)
            .map(|(stats, weight)| field(stats) * weight)
            .sum::<f64>()
            / total
    };
    PerClassStats {
        precision: mean(|s| s.precision),
        recall: mean(|s| s.recall),
        f1: mean(|s| s.f1),
        support: per_class.iter().map(|stats| stats.support).sum(),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let support = self.macro_avg.support;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (class, stats) in Outcome::ALL.iter().zip(&self.per_class) {
            write_row(f, &class.index().to_string(), stats)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, stats: &PerClassStats) -> fmt::Result {
    writeln!(
        f,
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        label, stats.precision, stats.recall, stats.f1, stats.support
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::{Diabetic as D, NotDiabetic as N};

    fn sample_matrix() -> ConfusionMatrix {
        // 6 true negatives, 2 false positives, 1 false negative, 3 true positives.
        let truth = [N, N, N, N, N, N, N, N, D, D, D, D];
        let predicted = [N, N, N, N, N, N, D, D, N, D, D, D];
        ConfusionMatrix::from_pairs(&truth, &predicted)
    }

    #[test]
    fn confusion_counts_cells() {
        let cm = sample_matrix();
        assert_eq!(cm.get(N, N), 6);
        assert_eq!(cm.get(N, D), 2);
        assert_eq!(cm.get(D, N), 1);
        assert_eq!(cm.get(D, D), 3);
        assert_eq!(cm.total(), 12);
    }

    #[test]
    fn per_class_precision_recall_f1() {
        let stats = precision_recall_by_class(&sample_matrix());
        assert!((stats[1].precision - 0.6).abs() < 1e-12);
        assert!((stats[1].recall - 0.75).abs() < 1e-12);
        assert!((stats[1].f1 - 2.0 * 0.6 * 0.75 / 1.35).abs() < 1e-12);
        assert_eq!(stats[0].support, 8);
        assert_eq!(stats[1].support, 4);
        assert!((stats[0].precision - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn accuracy_and_averages() {
        let report = ClassificationReport::from_confusion(&sample_matrix());
        assert!((report.accuracy - 0.75).abs() < 1e-12);
        let expected_macro = (report.per_class[0].recall + report.per_class[1].recall) / 2.0;
        assert!((report.macro_avg.recall - expected_macro).abs() < 1e-12);
        // Weighted recall equals accuracy.
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 12);
    }

    #[test]
    fn empty_matrix_reports_zeros() {
        let report = ClassificationReport::from_confusion(&ConfusionMatrix::new());
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.macro_avg.f1, 0.0);
        assert_eq!(report.weighted_avg.precision, 0.0);
    }

    #[test]
    fn report_renders_rows() {
        let text = ClassificationReport::from_confusion(&sample_matrix()).to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
    }
}
