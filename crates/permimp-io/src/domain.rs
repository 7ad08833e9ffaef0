//! Domain types for permimp-io.

use std::collections::BTreeMap;

use permimp_core::FeatureMatrix;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tabular dataset split into a feature matrix and a numeric outcome.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). `outcome[i]` belongs
/// to row `i` of `matrix`.
#[derive(Debug)]
pub struct Dataset {
    /// Feature columns in header order, target excluded.
    pub matrix: FeatureMatrix,
    /// Target values in row order.
    pub outcome: Vec<f64>,
    /// Name of the target column.
    pub target: String,
    /// Level labels of each categorical column; code `k` is `levels[k]`.
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Dataset {
    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    /// Return the label of category code `code` in column `column`.
    #[must_use]
    pub fn category_label(&self, column: &str, code: f64) -> Option<&str> {
        let levels = self.categories.get(column)?;
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        levels.get(code as usize).map(String::as_str)
    }
}
