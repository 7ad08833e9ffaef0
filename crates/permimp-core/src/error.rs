use std::fmt;

/// Boxed error type returned by a wrapped model's prediction function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The point in an importance run at which a scoring call was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Scoring the unmodified feature matrix.
    Baseline,
    /// Scoring a matrix with one feature (or feature group) permuted.
    Permuted {
        /// Feature or group name.
        feature: String,
        /// Zero-based repetition (or cyclic shift) index.
        repetition: usize,
    },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Permuted {
                feature,
                repetition,
            } => write!(f, "feature \"{feature}\", repetition {repetition}"),
        }
    }
}

/// Errors from building a [`FeatureMatrix`](crate::FeatureMatrix).
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// Returned when no feature columns are supplied.
    #[error("feature matrix has zero columns")]
    NoColumns,

    /// Returned when the number of names differs from the number of columns.
    #[error("{names} column names supplied for {columns} columns")]
    NameCountMismatch {
        /// Number of names supplied.
        names: usize,
        /// Number of columns supplied.
        columns: usize,
    },

    /// Returned when the number of feature kinds differs from the number of columns.
    #[error("{kinds} feature kinds supplied for {columns} columns")]
    KindCountMismatch {
        /// Number of kinds supplied.
        kinds: usize,
        /// Number of columns in the matrix.
        columns: usize,
    },

    /// Returned when two columns share a name.
    #[error("duplicate column name \"{name}\"")]
    DuplicateColumn {
        /// The repeated name.
        name: String,
    },

    /// Returned when a column has a different length from the first column.
    #[error("column \"{column}\" has {got} rows, expected {expected}")]
    RaggedColumn {
        /// Name of the offending column.
        column: String,
        /// Row count of the first column.
        expected: usize,
        /// Row count of the offending column.
        got: usize,
    },

    /// Returned when a row-major sample has the wrong number of values.
    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Number of column names.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value at row {row}, column \"{column}\"")]
    NonFiniteValue {
        /// Zero-based row index.
        row: usize,
        /// Name of the offending column.
        column: String,
    },

    /// Returned when a categorical column holds something other than a non-negative integer code.
    #[error("invalid category code {value} at row {row}, column \"{column}\"")]
    InvalidCategoryCode {
        /// Zero-based row index.
        row: usize,
        /// Name of the offending column.
        column: String,
        /// The offending value.
        value: f64,
    },
}

/// Ways a feature matrix can disagree with what the model or outcome expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMismatch {
    /// Column count differs from the model's feature count.
    #[error("matrix has {got} columns, model expects {expected}")]
    ColumnCount {
        /// Columns the model expects.
        expected: usize,
        /// Columns in the matrix.
        got: usize,
    },

    /// A column name differs from the model's feature name at the same position.
    #[error("column {index} is \"{got}\", model expects \"{expected}\"")]
    ColumnName {
        /// Zero-based column index.
        index: usize,
        /// Name the model expects.
        expected: String,
        /// Name in the matrix.
        got: String,
    },

    /// Row count differs from the length of the bound outcome vector.
    #[error("matrix has {got} rows, outcome vector has {expected}")]
    RowCount {
        /// Length of the outcome vector.
        expected: usize,
        /// Rows in the matrix.
        got: usize,
    },
}

/// Errors from a single [`PredictorAdapter::score`](crate::PredictorAdapter::score) call.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The matrix does not match the model's feature set or the outcome length.
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaMismatch),

    /// The wrapped model returned an error.
    #[error("model invocation failed")]
    ModelInvocation(#[source] BoxError),

    /// The model returned the wrong number of predictions.
    #[error("model returned {got} predictions for {expected} rows")]
    PredictionLength {
        /// Rows in the matrix.
        expected: usize,
        /// Predictions returned.
        got: usize,
    },

    /// The loss function returned a negative or non-finite value.
    #[error("loss \"{loss}\" returned {value}, expected a finite non-negative value")]
    InvalidLoss {
        /// Name of the loss function.
        loss: String,
        /// The offending value.
        value: f64,
    },
}

impl AdapterError {
    /// Attach the stage at which the failing call happened.
    pub(crate) fn at(self, stage: Stage) -> ImportanceError {
        match self {
            Self::InvalidSchema(mismatch) => ImportanceError::InvalidSchema { stage, mismatch },
            Self::ModelInvocation(source) => ImportanceError::ModelInvocation { stage, source },
            Self::PredictionLength { expected, got } => ImportanceError::PredictionLength {
                stage,
                expected,
                got,
            },
            Self::InvalidLoss { loss, value } => ImportanceError::InvalidLoss { stage, loss, value },
        }
    }
}

/// Errors from permutation importance computation.
#[derive(Debug, thiserror::Error)]
pub enum ImportanceError {
    /// Returned when n_repetitions is zero or too large to index a random stream.
    #[error("n_repetitions must be in [1, {max}], got {n_repetitions}")]
    InvalidRepetitions {
        /// The invalid n_repetitions value provided.
        n_repetitions: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// Returned when the outcome vector is not aligned with the matrix rows.
    #[error("outcome has {n_outcomes} values for {n_rows} rows")]
    OutcomeLengthMismatch {
        /// Rows in the feature matrix.
        n_rows: usize,
        /// Length of the outcome vector.
        n_outcomes: usize,
    },

    /// Returned when the dataset has fewer than two instances.
    #[error("permutation needs at least 2 instances, got {n_rows}")]
    DegenerateDataset {
        /// Rows in the feature matrix.
        n_rows: usize,
    },

    /// Returned when the feature scope resolves to zero features.
    #[error("feature scope resolves to zero features")]
    EmptyFeatureSet,

    /// Returned when a requested feature name is not a matrix column.
    #[error("unknown feature \"{name}\"")]
    UnknownFeature {
        /// The unknown name.
        name: String,
    },

    /// Returned when a feature group lists no features.
    #[error("feature group \"{group}\" is empty")]
    EmptyFeatureGroup {
        /// Name of the empty group.
        group: String,
    },

    /// Returned when two feature groups share a name.
    #[error("duplicate feature group \"{group}\"")]
    DuplicateFeatureGroup {
        /// The repeated group name.
        group: String,
    },

    /// Returned when the matrix does not match the model's feature set.
    #[error("invalid schema at {stage}")]
    InvalidSchema {
        /// Where the mismatch was detected.
        stage: Stage,
        /// What did not match.
        #[source]
        mismatch: SchemaMismatch,
    },

    /// Returned when the wrapped model fails during prediction.
    #[error("model invocation failed at {stage}")]
    ModelInvocation {
        /// Where the failing call was made.
        stage: Stage,
        /// The model's error.
        #[source]
        source: BoxError,
    },

    /// Returned when the model returns the wrong number of predictions.
    #[error("model returned {got} predictions for {expected} rows at {stage}")]
    PredictionLength {
        /// Where the call was made.
        stage: Stage,
        /// Rows in the matrix.
        expected: usize,
        /// Predictions returned.
        got: usize,
    },

    /// Returned when the loss function yields a negative or non-finite value.
    #[error("loss \"{loss}\" returned {value} at {stage}")]
    InvalidLoss {
        /// Where the call was made.
        stage: Stage,
        /// Name of the loss function.
        loss: String,
        /// The offending value.
        value: f64,
    },

    /// Returned in ratio mode when the baseline error is exactly zero.
    #[error("baseline {loss} is zero, ratio importance is undefined (use difference mode)")]
    ZeroBaseline {
        /// Name of the loss function.
        loss: String,
    },

    /// Returned when the run was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("importance computation cancelled")]
    Cancelled,
}
