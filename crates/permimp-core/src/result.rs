//! Result types for permutation importance.

use serde::{Deserialize, Serialize};

use crate::config::{Method, ScoreMode};
use crate::summary::{Summary, quantile_sorted};

/// Aggregated importance of one feature (or feature group).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature or group name.
    pub name: String,
    /// Columns permuted for this entry (one for a single feature).
    pub features: Vec<String>,
    /// Mean importance across repetitions.
    pub importance: f64,
    /// Mean permuted error across repetitions.
    pub permutation_error: f64,
    /// Population standard deviation of the repetition importances.
    pub std: f64,
    /// 5% quantile of the repetition importances.
    pub quantile_05: f64,
    /// 95% quantile of the repetition importances.
    pub quantile_95: f64,
    /// Smallest repetition importance.
    pub min: f64,
    /// Largest repetition importance.
    pub max: f64,
    /// Per-repetition importances, in repetition order.
    pub raw: Vec<f64>,
    /// Rank (1 = most important).
    pub rank: usize,
}

impl FeatureImportance {
    /// Build an unranked entry from the permuted errors of each repetition.
    pub(crate) fn from_errors(
        name: String,
        features: Vec<String>,
        permuted_errors: &[f64],
        baseline_error: f64,
        score_mode: ScoreMode,
    ) -> Self {
        let raw: Vec<f64> = permuted_errors
            .iter()
            .map(|&e| score_mode.importance(e, baseline_error))
            .collect();
        let summary: Summary = raw.iter().copied().collect();
        let errors: Summary = permuted_errors.iter().copied().collect();

        let mut sorted = raw.clone();
        sorted.sort_by(f64::total_cmp);

        Self {
            name,
            features,
            importance: summary.mean(),
            permutation_error: errors.mean(),
            std: summary.std(),
            quantile_05: quantile_sorted(&sorted, 0.05),
            quantile_95: quantile_sorted(&sorted, 0.95),
            min: summary.min(),
            max: summary.max(),
            raw,
            rank: 0, // will be set after sorting
        }
    }

    /// Population variance of the repetition importances.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    /// Linearly interpolated `q` quantile of the repetition importances.
    #[must_use]
    pub fn quantile(&self, q: f64) -> f64 {
        let mut sorted = self.raw.clone();
        sorted.sort_by(f64::total_cmp);
        quantile_sorted(&sorted, q)
    }
}

/// Ranked permutation importances for every scored feature.
///
/// Records are sorted by descending importance. Ties keep scope order:
/// original column order for single features, declaration order for groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceTable {
    /// Model error on the unmodified data.
    pub baseline_error: f64,
    /// Name of the loss function.
    pub loss: String,
    /// Permutation method used.
    pub method: Method,
    /// Score mode used.
    pub score_mode: ScoreMode,
    /// Number of instances.
    pub n_rows: usize,
    /// Permuted scorings per feature (repetitions, or n - 1 shifts in exact mode).
    pub n_repetitions: usize,
    /// Seed of the random streams.
    pub seed: u64,
    records: Vec<FeatureImportance>,
}

impl ImportanceTable {
    /// Sort `records` descending by importance, assign 1-based ranks, and build the table.
    ///
    /// `records` must arrive in scope order; the sort is stable.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn ranked(
        mut records: Vec<FeatureImportance>,
        baseline_error: f64,
        loss: String,
        method: Method,
        score_mode: ScoreMode,
        n_rows: usize,
        n_repetitions: usize,
        seed: u64,
    ) -> Self {
        records.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        for (i, record) in records.iter_mut().enumerate() {
            record.rank = i + 1;
        }
        Self {
            baseline_error,
            loss,
            method,
            score_mode,
            n_rows,
            n_repetitions,
            seed,
            records,
        }
    }

    /// Return the ranked records.
    #[must_use]
    pub fn records(&self) -> &[FeatureImportance] {
        &self.records
    }

    /// Look up a record by feature or group name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureImportance> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Return the `k` most important records.
    #[must_use]
    pub fn top_k(&self, k: usize) -> &[FeatureImportance] {
        &self.records[..k.min(self.records.len())]
    }

    /// Return the feature names in rank order.
    #[must_use]
    pub fn ranking(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, errors: &[f64]) -> FeatureImportance {
        FeatureImportance::from_errors(
            name.to_string(),
            vec![name.to_string()],
            errors,
            2.0,
            ScoreMode::Ratio,
        )
    }

    fn table(records: Vec<FeatureImportance>) -> ImportanceTable {
        ImportanceTable::ranked(records, 2.0, "mae".into(), Method::Shuffle, ScoreMode::Ratio, 10, 3, 42)
    }

    #[test]
    fn record_statistics() {
        let r = record("a", &[2.0, 4.0, 6.0]);
        assert_eq!(r.raw, vec![1.0, 2.0, 3.0]);
        assert!((r.importance - 2.0).abs() < 1e-12);
        assert!((r.permutation_error - 4.0).abs() < 1e-12);
        assert!((r.variance() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.min, 1.0);
        assert_eq!(r.max, 3.0);
        assert!((r.quantile(0.5) - 2.0).abs() < 1e-12);
        assert!((r.quantile_05 - 1.1).abs() < 1e-12);
        assert!((r.quantile_95 - 2.9).abs() < 1e-12);
    }

    #[test]
    fn ranked_descending_with_stable_ties() {
        let t = table(vec![
            record("a", &[2.0]),
            record("b", &[6.0]),
            record("c", &[2.0]),
            record("d", &[4.0]),
        ]);
        assert_eq!(t.ranking(), vec!["b", "d", "a", "c"]);
        let ranks: Vec<usize> = t.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn infinite_importance_ranks_first() {
        let t = table(vec![
            record("a", &[4.0, 4.0]),
            record("b", &[f64::INFINITY, f64::INFINITY]),
            record("c", &[6.0, 2.0]),
        ]);
        let b = t.get("b").unwrap();
        assert_eq!(b.importance, f64::INFINITY);
        assert_eq!(b.std, 0.0);
        assert_eq!(b.quantile_05, f64::INFINITY);
        assert_eq!(t.ranking(), vec!["b", "a", "c"]);
    }

    #[test]
    fn lookup_and_top_k() {
        let t = table(vec![record("a", &[2.0]), record("b", &[6.0])]);
        assert_eq!(t.get("a").unwrap().rank, 2);
        assert!(t.get("zzz").is_none());
        assert_eq!(t.top_k(1)[0].name, "b");
        assert_eq!(t.top_k(10).len(), 2);
        assert_eq!(t.len(), 2);
        assert!(!t.is_empty());
    }

    #[test]
    fn serializes_to_json() {
        let t = table(vec![record("a", &[2.0, 3.0])]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["method"], "shuffle");
        assert_eq!(json["score_mode"], "ratio");
        assert_eq!(json["records"][0]["name"], "a");
        assert_eq!(json["records"][0]["raw"].as_array().unwrap().len(), 2);
    }
}
