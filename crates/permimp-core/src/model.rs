//! The model capability consumed by the importance engine.

use crate::error::BoxError;
use crate::matrix::FeatureMatrix;

/// A trained predictive model, seen only through its prediction function.
///
/// The engine never inspects or mutates the model. Any estimator, regardless of
/// how it was trained, takes part by implementing this trait.
///
/// The `Sync` bound holds even under [`Execution::Sequential`]. A model with
/// unsynchronized interior state (a `RefCell` cache, say) cannot implement
/// this trait directly; wrap that state in a `Mutex` and return `false` from
/// [`concurrent_safe`](Self::concurrent_safe). That flag only serializes calls
/// on models that are already `Sync`.
///
/// [`Execution::Sequential`]: crate::Execution::Sequential
pub trait Model: Sync {
    /// Predict one value per row of `features`, preserving row order.
    ///
    /// Must be deterministic for a fixed input.
    ///
    /// # Errors
    ///
    /// Any error is propagated unchanged to the caller of the importance run.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, BoxError>;

    /// Number of feature columns the model expects.
    fn n_features(&self) -> usize;

    /// Column names the model expects, in order, if it knows them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Whether `predict` may be called from several threads at once.
    ///
    /// When `false`, calls are serialized per model instance.
    fn concurrent_safe(&self) -> bool {
        true
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, BoxError> {
        (**self).predict(features)
    }

    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn feature_names(&self) -> Option<&[String]> {
        (**self).feature_names()
    }

    fn concurrent_safe(&self) -> bool {
        (**self).concurrent_safe()
    }
}

/// A [`Model`] backed by a prediction closure.
///
/// ```
/// use permimp_core::{FeatureMatrix, FnModel, Model};
///
/// let model = FnModel::new(2, |x: &FeatureMatrix| {
///     Ok(x.column(0).iter().map(|a| 2.0 * a).collect())
/// });
/// assert_eq!(model.n_features(), 2);
/// ```
pub struct FnModel<F> {
    predict_fn: F,
    n_features: usize,
    feature_names: Option<Vec<String>>,
    concurrent_safe: bool,
}

impl<F> FnModel<F>
where
    F: Fn(&FeatureMatrix) -> Result<Vec<f64>, BoxError> + Sync,
{
    /// Wrap `predict_fn` as a model over `n_features` columns.
    pub fn new(n_features: usize, predict_fn: F) -> Self {
        Self {
            predict_fn,
            n_features,
            feature_names: None,
            concurrent_safe: true,
        }
    }

    /// Require the matrix columns to carry these names, in order.
    #[must_use]
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.n_features = names.len();
        self.feature_names = Some(names);
        self
    }

    /// Declare whether the closure may run on several threads at once.
    #[must_use]
    pub fn with_concurrent_safe(mut self, concurrent_safe: bool) -> Self {
        self.concurrent_safe = concurrent_safe;
        self
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&FeatureMatrix) -> Result<Vec<f64>, BoxError> + Sync,
{
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, BoxError> {
        (self.predict_fn)(features)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn concurrent_safe(&self) -> bool {
        self.concurrent_safe
    }
}

impl<F> std::fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModel")
            .field("n_features", &self.n_features)
            .field("feature_names", &self.feature_names)
            .field("concurrent_safe", &self.concurrent_safe)
            .finish_non_exhaustive()
    }
}
