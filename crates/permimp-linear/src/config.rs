use permimp_core::FeatureMatrix;
use tracing::{debug, instrument};

use crate::error::LinearError;
use crate::model::LinearRegression;
use crate::solve::solve;

/// Configuration for ordinary least squares / ridge regression.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `l2`            | 0.0     |
/// | `fit_intercept` | `true`  |
#[derive(Debug, Clone)]
pub struct LinearRegressionConfig {
    l2: f64,
    fit_intercept: bool,
}

impl Default for LinearRegressionConfig {
    fn default() -> Self {
        Self {
            l2: 0.0,
            fit_intercept: true,
        }
    }
}

impl LinearRegressionConfig {
    /// Create a config with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ridge penalty on the coefficients. The intercept is never penalized.
    #[must_use]
    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    /// Set whether an intercept is fitted.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Return the ridge penalty.
    #[must_use]
    pub fn l2(&self) -> f64 {
        self.l2
    }

    /// Return whether an intercept is fitted.
    #[must_use]
    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// Fit by solving the normal equations `(XᵀX + λI) w = Xᵀy`.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                     |
    /// |------------------------------------------|------------------------------------------|
    /// | [`LinearError::InvalidL2`]               | `l2` is negative or non-finite           |
    /// | [`LinearError::EmptyDataset`]            | the matrix has zero rows                 |
    /// | [`LinearError::OutcomeLengthMismatch`]   | `outcome.len() != features.n_rows()`     |
    /// | [`LinearError::NonFiniteOutcome`]        | any outcome is NaN or infinite           |
    /// | [`LinearError::SingularSystem`]          | the normal equations are singular        |
    #[instrument(skip_all, fields(n_rows = features.n_rows(), n_features = features.n_features(), l2 = self.l2))]
    pub fn fit(&self, features: &FeatureMatrix, outcome: &[f64]) -> Result<LinearRegression, LinearError> {
        if !self.l2.is_finite() || self.l2 < 0.0 {
            return Err(LinearError::InvalidL2 { l2: self.l2 });
        }
        let n_rows = features.n_rows();
        if n_rows == 0 {
            return Err(LinearError::EmptyDataset);
        }
        if outcome.len() != n_rows {
            return Err(LinearError::OutcomeLengthMismatch {
                n_rows,
                n_outcomes: outcome.len(),
            });
        }
        if let Some(row) = outcome.iter().position(|v| !v.is_finite()) {
            return Err(LinearError::NonFiniteOutcome { row });
        }

        // Design columns: the features, then a column of ones for the intercept.
        let n_features = features.n_features();
        let ones = vec![1.0; n_rows];
        let mut design: Vec<&[f64]> = (0..n_features).map(|j| features.column(j)).collect();
        if self.fit_intercept {
            design.push(&ones);
        }
        let dim = design.len();

        let mut gram = vec![vec![0.0; dim]; dim];
        let mut rhs = vec![0.0; dim];
        for i in 0..dim {
            for k in i..dim {
                let dot: f64 = design[i].iter().zip(design[k]).map(|(a, b)| a * b).sum();
                gram[i][k] = dot;
                gram[k][i] = dot;
            }
            rhs[i] = design[i].iter().zip(outcome).map(|(a, y)| a * y).sum();
        }
        for (j, row) in gram.iter_mut().enumerate().take(n_features) {
            row[j] += self.l2;
        }

        let mut weights = solve(gram, rhs)?;
        let intercept = if self.fit_intercept {
            weights.pop().unwrap_or(0.0)
        } else {
            0.0
        };

        debug!(intercept, "linear regression fitted");

        Ok(LinearRegression {
            coefficients: weights,
            intercept,
            feature_names: features.names().to_vec(),
        })
    }
}
