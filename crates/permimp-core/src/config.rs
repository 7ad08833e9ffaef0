//! Configuration builder for permutation importance runs.

use crate::cancel::CancelToken;
use crate::error::ImportanceError;
use crate::loss::Loss;
use crate::matrix::FeatureMatrix;
use crate::model::Model;
use crate::result::ImportanceTable;

/// Largest accepted repetition count; each repetition indexes its own random stream.
pub const MAX_REPETITIONS: usize = u32::MAX as usize;

/// How the permuted column values are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// One random shuffle of the column per repetition. O(n) per repetition.
    Shuffle,
    /// Every ordered pairing of an instance with another instance's value,
    /// evaluated as the n - 1 cyclic shifts of the column. O(n²) per feature.
    /// The repetition count is ignored.
    ExactPairs,
}

/// How permuted error is compared with the baseline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// `e_perm / e_orig`; 1.0 means the feature carries no information.
    Ratio,
    /// `e_perm - e_orig`; 0.0 means the feature carries no information.
    Difference,
}

impl ScoreMode {
    /// Importance of one permuted error against the baseline.
    #[must_use]
    pub fn importance(self, permuted_error: f64, baseline_error: f64) -> f64 {
        match self {
            Self::Ratio => permuted_error / baseline_error,
            Self::Difference => permuted_error - baseline_error,
        }
    }
}

/// Whether scoring units run on the rayon pool or on the calling thread.
///
/// Results are bit-identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Parallel map over (feature, repetition) units.
    Parallel,
    /// A plain loop on the calling thread.
    Sequential,
}

/// Several columns permuted together with one shared row permutation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeatureGroup {
    /// Name reported in the result table.
    pub name: String,
    /// Column names in the group.
    pub features: Vec<String>,
}

impl FeatureGroup {
    /// Create a group from a name and its member columns.
    pub fn new(name: impl Into<String>, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which features are scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureScope {
    /// Every column, one at a time.
    All,
    /// The named columns, one at a time, in original column order.
    Features(Vec<String>),
    /// Each group permuted jointly, in declaration order.
    Groups(Vec<FeatureGroup>),
}

/// Configuration for a permutation importance run.
///
/// Construct via [`ImportanceConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default      |
/// |-----------------|--------------|
/// | `method`        | `Shuffle`    |
/// | `score_mode`    | `Ratio`      |
/// | `features`      | `All`        |
/// | `seed`          | 42           |
/// | `execution`     | `Parallel`   |
///
/// [`ImportanceConfig::default`] uses a single repetition.
#[derive(Debug, Clone)]
pub struct ImportanceConfig {
    pub(crate) n_repetitions: usize,
    pub(crate) method: Method,
    pub(crate) score_mode: ScoreMode,
    pub(crate) features: FeatureScope,
    pub(crate) seed: u64,
    pub(crate) execution: Execution,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            n_repetitions: 1,
            method: Method::Shuffle,
            score_mode: ScoreMode::Ratio,
            features: FeatureScope::All,
            seed: 42,
            execution: Execution::Parallel,
        }
    }
}

impl ImportanceConfig {
    /// Create a new config with the given number of repetitions per feature.
    ///
    /// # Errors
    ///
    /// Returns [`ImportanceError::InvalidRepetitions`] if `n_repetitions` is zero
    /// or exceeds [`MAX_REPETITIONS`].
    pub fn new(n_repetitions: usize) -> Result<Self, ImportanceError> {
        validate_repetitions(n_repetitions)?;
        Ok(Self {
            n_repetitions,
            ..Self::default()
        })
    }

    // --- Setters ---

    /// Set the permutation method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set ratio or difference scoring.
    #[must_use]
    pub fn with_score_mode(mut self, score_mode: ScoreMode) -> Self {
        self.score_mode = score_mode;
        self
    }

    /// Restrict scoring to the named columns.
    #[must_use]
    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features = FeatureScope::Features(features.into_iter().map(Into::into).collect());
        self
    }

    /// Score groups of columns, each permuted jointly.
    #[must_use]
    pub fn with_feature_groups(mut self, groups: Vec<FeatureGroup>) -> Self {
        self.features = FeatureScope::Groups(groups);
        self
    }

    /// Set the feature scope directly.
    #[must_use]
    pub fn with_scope(mut self, scope: FeatureScope) -> Self {
        self.features = scope;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set parallel or sequential execution.
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    // --- Getters ---

    /// Return the number of repetitions per feature.
    #[must_use]
    pub fn n_repetitions(&self) -> usize {
        self.n_repetitions
    }

    /// Return the permutation method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Return the score mode.
    #[must_use]
    pub fn score_mode(&self) -> ScoreMode {
        self.score_mode
    }

    /// Return the feature scope.
    #[must_use]
    pub fn scope(&self) -> &FeatureScope {
        &self.features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the execution mode.
    #[must_use]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Compute permutation importance of `model` on (`features`, `outcome`) under `loss`.
    ///
    /// `outcome[sample_idx]` is aligned 1:1 with the matrix rows.
    ///
    /// # Errors
    ///
    /// | Variant                                    | When                                              |
    /// |--------------------------------------------|---------------------------------------------------|
    /// | [`ImportanceError::OutcomeLengthMismatch`] | `outcome.len() != features.n_rows()`              |
    /// | [`ImportanceError::DegenerateDataset`]     | fewer than 2 rows                                 |
    /// | [`ImportanceError::EmptyFeatureSet`]       | the scope resolves to no features                 |
    /// | [`ImportanceError::UnknownFeature`]        | a scoped name is not a column                     |
    /// | [`ImportanceError::EmptyFeatureGroup`]     | a group lists no columns                          |
    /// | [`ImportanceError::InvalidSchema`]         | the matrix does not match the model               |
    /// | [`ImportanceError::ModelInvocation`]       | the model fails during prediction                 |
    /// | [`ImportanceError::InvalidLoss`]           | the loss is negative or non-finite                |
    /// | [`ImportanceError::ZeroBaseline`]          | ratio mode with a baseline error of exactly zero  |
    pub fn compute<M, L>(
        &self,
        model: &M,
        features: &FeatureMatrix,
        outcome: &[f64],
        loss: &L,
    ) -> Result<ImportanceTable, ImportanceError>
    where
        M: Model + ?Sized,
        L: Loss + ?Sized,
    {
        crate::engine::compute_importance(self, model, features, outcome, loss, &CancelToken::new())
    }

    /// Like [`compute`](Self::compute), checking `cancel` between scoring units.
    ///
    /// # Errors
    ///
    /// As [`compute`](Self::compute), plus [`ImportanceError::Cancelled`] once
    /// `cancel` is triggered. Partial results are discarded.
    pub fn compute_with_cancel<M, L>(
        &self,
        model: &M,
        features: &FeatureMatrix,
        outcome: &[f64],
        loss: &L,
        cancel: &CancelToken,
    ) -> Result<ImportanceTable, ImportanceError>
    where
        M: Model + ?Sized,
        L: Loss + ?Sized,
    {
        crate::engine::compute_importance(self, model, features, outcome, loss, cancel)
    }
}

pub(crate) fn validate_repetitions(n_repetitions: usize) -> Result<(), ImportanceError> {
    if n_repetitions == 0 || n_repetitions > MAX_REPETITIONS {
        return Err(ImportanceError::InvalidRepetitions {
            n_repetitions,
            max: MAX_REPETITIONS,
        });
    }
    Ok(())
}
