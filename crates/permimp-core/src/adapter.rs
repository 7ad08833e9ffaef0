//! Predictor adapter: scores a feature matrix against a bound outcome vector.

use std::sync::{Mutex, PoisonError};

use crate::error::{AdapterError, BoxError, SchemaMismatch};
use crate::loss::Loss;
use crate::matrix::FeatureMatrix;
use crate::model::Model;

/// Wraps an opaque model, the true outcomes, and a loss into a single
/// `score(matrix) -> error` contract.
///
/// The adapter never mutates the matrix and does not cache results. Models
/// that declare themselves not [`concurrent_safe`](Model::concurrent_safe) are
/// invoked under a per-adapter lock.
pub struct PredictorAdapter<'a, M: ?Sized, L: ?Sized> {
    model: &'a M,
    outcome: &'a [f64],
    loss: &'a L,
    gate: Option<Mutex<()>>,
}

impl<'a, M, L> PredictorAdapter<'a, M, L>
where
    M: Model + ?Sized,
    L: Loss + ?Sized,
{
    /// Bind a model, the true outcomes, and a loss function.
    pub fn new(model: &'a M, outcome: &'a [f64], loss: &'a L) -> Self {
        let gate = (!model.concurrent_safe()).then(|| Mutex::new(()));
        Self {
            model,
            outcome,
            loss,
            gate,
        }
    }

    /// Check that `matrix` matches the model's feature set and the outcome length.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaMismatch`] found.
    pub fn check_schema(&self, matrix: &FeatureMatrix) -> Result<(), SchemaMismatch> {
        let expected = self.model.n_features();
        if matrix.n_features() != expected {
            return Err(SchemaMismatch::ColumnCount {
                expected,
                got: matrix.n_features(),
            });
        }
        if let Some(expected_names) = self.model.feature_names() {
            for (index, (want, got)) in expected_names.iter().zip(matrix.names()).enumerate() {
                if want != got {
                    return Err(SchemaMismatch::ColumnName {
                        index,
                        expected: want.clone(),
                        got: got.clone(),
                    });
                }
            }
        }
        if matrix.n_rows() != self.outcome.len() {
            return Err(SchemaMismatch::RowCount {
                expected: self.outcome.len(),
                got: matrix.n_rows(),
            });
        }
        Ok(())
    }

    /// Compute `loss(outcome, model.predict(matrix))`.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                            |
    /// |-------------------------------------|-------------------------------------------------|
    /// | [`AdapterError::InvalidSchema`]     | columns or rows do not match                    |
    /// | [`AdapterError::ModelInvocation`]   | the model returned an error                     |
    /// | [`AdapterError::PredictionLength`]  | the model returned the wrong number of values   |
    /// | [`AdapterError::InvalidLoss`]       | the loss is negative, NaN, or infinite          |
    pub fn score(&self, matrix: &FeatureMatrix) -> Result<f64, AdapterError> {
        self.check_schema(matrix)?;

        let predictions = self.invoke(matrix).map_err(AdapterError::ModelInvocation)?;
        if predictions.len() != matrix.n_rows() {
            return Err(AdapterError::PredictionLength {
                expected: matrix.n_rows(),
                got: predictions.len(),
            });
        }

        let value = self.loss.evaluate(self.outcome, &predictions);
        if !value.is_finite() || value < 0.0 {
            return Err(AdapterError::InvalidLoss {
                loss: self.loss.name().to_string(),
                value,
            });
        }
        Ok(value)
    }

    /// Return the bound loss's name.
    #[must_use]
    pub fn loss_name(&self) -> &str {
        self.loss.name()
    }

    fn invoke(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, BoxError> {
        match &self.gate {
            Some(gate) => {
                // A panic inside another call cannot leave `()` inconsistent.
                let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
                self.model.predict(matrix)
            }
            None => self.model.predict(matrix),
        }
    }
}
