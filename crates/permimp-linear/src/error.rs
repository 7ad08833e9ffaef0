/// Errors from fitting or applying a linear regression.
#[derive(Debug, thiserror::Error)]
pub enum LinearError {
    /// Returned when the ridge penalty is negative or non-finite.
    #[error("l2 penalty must be finite and >= 0, got {l2}")]
    InvalidL2 {
        /// The invalid penalty provided.
        l2: f64,
    },

    /// Returned when the training dataset has zero rows.
    #[error("training dataset has zero rows")]
    EmptyDataset,

    /// Returned when the outcome vector is not aligned with the matrix rows.
    #[error("outcome has {n_outcomes} values for {n_rows} rows")]
    OutcomeLengthMismatch {
        /// Rows in the feature matrix.
        n_rows: usize,
        /// Length of the outcome vector.
        n_outcomes: usize,
    },

    /// Returned when any outcome value is NaN or infinite.
    #[error("non-finite outcome at row {row}")]
    NonFiniteOutcome {
        /// Zero-based row index.
        row: usize,
    },

    /// Returned when the normal equations have no unique solution.
    #[error("normal equations are singular at pivot {pivot} (collinear features? try l2 > 0)")]
    SingularSystem {
        /// Zero-based elimination step at which no usable pivot was found.
        pivot: usize,
    },

    /// Returned when predicting on a matrix with a different column layout.
    #[error("model expects {expected} features, got {got}")]
    PredictionFeatureMismatch {
        /// Features the model was trained on.
        expected: usize,
        /// Features in the matrix.
        got: usize,
    },
}
