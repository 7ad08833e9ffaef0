use permimp_core::{BoxError, FeatureMatrix, Model};
use serde::{Deserialize, Serialize};

use crate::error::LinearError;

/// A fitted linear model `y = intercept + Σ coefficients[j] * x[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub(crate) coefficients: Vec<f64>,
    pub(crate) intercept: f64,
    pub(crate) feature_names: Vec<String>,
}

impl LinearRegression {
    /// Return one coefficient per feature, in column order.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Return the fitted intercept (0.0 when fitted without one).
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Return the training column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the coefficient of the named feature.
    #[must_use]
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|j| self.coefficients[j])
    }

    /// Predict one value per row.
    ///
    /// # Errors
    ///
    /// Returns [`LinearError::PredictionFeatureMismatch`] if the matrix does not
    /// have as many columns as the model has coefficients.
    pub fn predict_matrix(&self, features: &FeatureMatrix) -> Result<Vec<f64>, LinearError> {
        if features.n_features() != self.coefficients.len() {
            return Err(LinearError::PredictionFeatureMismatch {
                expected: self.coefficients.len(),
                got: features.n_features(),
            });
        }
        let mut out = vec![self.intercept; features.n_rows()];
        for (j, &w) in self.coefficients.iter().enumerate() {
            for (o, &v) in out.iter_mut().zip(features.column(j)) {
                *o += w * v;
            }
        }
        Ok(out)
    }
}

impl Model for LinearRegression {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, BoxError> {
        Ok(self.predict_matrix(features)?)
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }
}
