//! Loss functions reducing (outcome, prediction) pairs to a scalar error.

use std::fmt;
use std::str::FromStr;

/// A deterministic map from true outcomes and predictions to a non-negative error.
///
/// Closures `Fn(&[f64], &[f64]) -> f64` implement this trait with the name `"custom"`.
pub trait Loss: Sync {
    /// Short identifier used in logs and results.
    fn name(&self) -> &str;

    /// Aggregate error of `y_pred` against `y_true`. Both slices have equal length.
    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64;
}

impl<F> Loss for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        self(y_true, y_pred)
    }
}

fn mean_of(y_true: &[f64], y_pred: &[f64], per_instance: impl Fn(f64, f64) -> f64) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| per_instance(t, p))
        .sum();
    total / y_true.len() as f64
}

/// Mean absolute error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAbsoluteError;

impl Loss for MeanAbsoluteError {
    fn name(&self) -> &str {
        "mae"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        mean_of(y_true, y_pred, |t, p| (t - p).abs())
    }
}

/// Mean squared error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Loss for MeanSquaredError {
    fn name(&self) -> &str {
        "mse"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        mean_of(y_true, y_pred, |t, p| (t - p) * (t - p))
    }
}

/// Root mean squared error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootMeanSquaredError;

impl Loss for RootMeanSquaredError {
    fn name(&self) -> &str {
        "rmse"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        MeanSquaredError.evaluate(y_true, y_pred).sqrt()
    }
}

/// Fraction of instances whose prediction, rounded to the nearest class code,
/// differs from the true class code.
#[derive(Debug, Clone, Copy, Default)]
pub struct MisclassificationRate;

impl Loss for MisclassificationRate {
    fn name(&self) -> &str {
        "ce"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        mean_of(y_true, y_pred, |t, p| {
            if t.round() == p.round() { 0.0 } else { 1.0 }
        })
    }
}

/// `1 - AUC` for binary outcomes.
///
/// Outcomes above 0.5 count as positives. Predictions are scores; AUC is the
/// Mann-Whitney statistic with average ranks for tied scores. When only one
/// class is present the AUC is taken to be 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneMinusAuc;

impl OneMinusAuc {
    /// Area under the ROC curve of `y_pred` scores against binary `y_true`.
    #[must_use]
    pub fn auc(y_true: &[f64], y_pred: &[f64]) -> f64 {
        let n = y_true.len().min(y_pred.len());
        let n_pos = y_true[..n].iter().filter(|&&t| t > 0.5).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return 0.5;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| y_pred[a].total_cmp(&y_pred[b]));

        // Average 1-based ranks over runs of tied scores.
        let mut pos_rank_sum = 0.0;
        let mut start = 0;
        while start < n {
            let mut end = start + 1;
            while end < n && y_pred[order[end]] == y_pred[order[start]] {
                end += 1;
            }
            let avg_rank = (start + 1 + end) as f64 / 2.0;
            for &idx in &order[start..end] {
                if y_true[idx] > 0.5 {
                    pos_rank_sum += avg_rank;
                }
            }
            start = end;
        }

        let n_pos_f = n_pos as f64;
        (pos_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
    }
}

impl Loss for OneMinusAuc {
    fn name(&self) -> &str {
        "auc"
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        1.0 - Self::auc(y_true, y_pred)
    }
}

/// The built-in losses, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// [`MeanAbsoluteError`] (`"mae"`).
    Mae,
    /// [`MeanSquaredError`] (`"mse"`).
    Mse,
    /// [`RootMeanSquaredError`] (`"rmse"`).
    Rmse,
    /// [`MisclassificationRate`] (`"ce"`).
    Ce,
    /// [`OneMinusAuc`] (`"auc"`).
    Auc,
}

impl LossKind {
    /// Every built-in loss, in declaration order.
    pub const ALL: [LossKind; 5] = [Self::Mae, Self::Mse, Self::Rmse, Self::Ce, Self::Auc];
}

impl Loss for LossKind {
    fn name(&self) -> &str {
        match self {
            Self::Mae => MeanAbsoluteError.name(),
            Self::Mse => MeanSquaredError.name(),
            Self::Rmse => RootMeanSquaredError.name(),
            Self::Ce => MisclassificationRate.name(),
            Self::Auc => OneMinusAuc.name(),
        }
    }

    fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        match self {
            Self::Mae => MeanAbsoluteError.evaluate(y_true, y_pred),
            Self::Mse => MeanSquaredError.evaluate(y_true, y_pred),
            Self::Rmse => RootMeanSquaredError.evaluate(y_true, y_pred),
            Self::Ce => MisclassificationRate.evaluate(y_true, y_pred),
            Self::Auc => OneMinusAuc.evaluate(y_true, y_pred),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown loss name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loss \"{name}\" (expected mae, mse, rmse, ce, or auc)")]
pub struct ParseLossError {
    /// The unrecognised name.
    pub name: String,
}

impl FromStr for LossKind {
    type Err = ParseLossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseLossError { name: s.to_string() })
    }
}
