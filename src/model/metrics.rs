//! Binary classification metrics.

use serde::Serialize;
use std::fmt;

const CLIP: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub log_loss: f64,
    pub n_samples: usize,
}

impl ClassificationMetrics {
    /// Evaluate probabilities against 0/1 labels at a 0.5 threshold.
    pub fn evaluate(y_true: &[f64], proba: &[f64]) -> Self {
        let (mut tp, mut fp, mut tn, mut fneg) = (0usize, 0usize, 0usize, 0usize);
        for (&y, &p) in y_true.iter().zip(proba) {
            match (y >= 0.5, p >= 0.5) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fneg += 1,
            }
        }

        let n = y_true.len();
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fneg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: ratio(tp + tn, n),
            precision,
            recall,
            f1,
            log_loss: log_loss(y_true, proba),
            n_samples: n,
        }
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy={:.4} precision={:.4} recall={:.4} f1={:.4} logloss={:.4} (n={})",
            self.accuracy, self.precision, self.recall, self.f1, self.log_loss, self.n_samples
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Mean binary cross-entropy with probabilities clipped away from 0 and 1.
pub fn log_loss(y_true: &[f64], proba: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(proba)
        .map(|(&y, &p)| {
            let p = p.clamp(CLIP, 1.0 - CLIP);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / y_true.len() as f64
}
