//! Column-major feature matrix.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::MatrixError;

/// Measurement type of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FeatureKind {
    /// Continuous or ordinal numeric values.
    Numeric,
    /// Non-negative integer category codes.
    Categorical,
}

/// An immutable, named, column-major feature matrix.
///
/// Each column is reference-counted, so [`with_columns_permuted`](Self::with_columns_permuted)
/// produces a new matrix that shares every untouched column with `self`.
/// The original matrix is never modified.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    kinds: Vec<FeatureKind>,
    columns: Vec<Arc<[f64]>>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a numeric matrix from named columns.
    ///
    /// `columns[feature_idx][sample_idx]`: column-major layout.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                   |
    /// |----------------------------------------|----------------------------------------|
    /// | [`MatrixError::NoColumns`]             | `columns` is empty                     |
    /// | [`MatrixError::NameCountMismatch`]     | `names.len() != columns.len()`         |
    /// | [`MatrixError::DuplicateColumn`]       | two columns share a name               |
    /// | [`MatrixError::RaggedColumn`]          | columns have different lengths         |
    /// | [`MatrixError::NonFiniteValue`]        | any value is NaN or infinite           |
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        if columns.is_empty() {
            return Err(MatrixError::NoColumns);
        }
        if names.len() != columns.len() {
            return Err(MatrixError::NameCountMismatch {
                names: names.len(),
                columns: columns.len(),
            });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(MatrixError::DuplicateColumn { name: name.clone() });
            }
        }

        let n_rows = columns[0].len();
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != n_rows {
                return Err(MatrixError::RaggedColumn {
                    column: name.clone(),
                    expected: n_rows,
                    got: column.len(),
                });
            }
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(MatrixError::NonFiniteValue {
                    row,
                    column: name.clone(),
                });
            }
        }

        let kinds = vec![FeatureKind::Numeric; names.len()];
        let columns = columns.into_iter().map(Arc::from).collect();
        Ok(Self {
            names,
            kinds,
            columns,
            n_rows,
        })
    }

    /// Build a numeric matrix from row-major samples.
    ///
    /// `rows[sample_idx][feature_idx]`. An empty `rows` gives a zero-row matrix.
    ///
    /// # Errors
    ///
    /// Same as [`from_columns`](Self::from_columns), plus
    /// [`MatrixError::RaggedRow`] when a row's length differs from `names.len()`.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let n_features = names.len();
        let mut columns = vec![Vec::with_capacity(rows.len()); n_features];
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(MatrixError::RaggedRow {
                    row: row_idx,
                    expected: n_features,
                    got: row.len(),
                });
            }
            for (column, &value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Self::from_columns(names, columns)
    }

    /// Declare the measurement type of every column.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                                   |
    /// |--------------------------------------|--------------------------------------------------------|
    /// | [`MatrixError::KindCountMismatch`]   | `kinds.len()` differs from the column count            |
    /// | [`MatrixError::InvalidCategoryCode`] | a categorical value is negative or not a whole number  |
    pub fn with_kinds(mut self, kinds: Vec<FeatureKind>) -> Result<Self, MatrixError> {
        if kinds.len() != self.columns.len() {
            return Err(MatrixError::KindCountMismatch {
                kinds: kinds.len(),
                columns: self.columns.len(),
            });
        }
        for ((name, column), kind) in self.names.iter().zip(&self.columns).zip(&kinds) {
            if *kind != FeatureKind::Categorical {
                continue;
            }
            if let Some(row) = column.iter().position(|&v| v < 0.0 || v.fract() != 0.0) {
                return Err(MatrixError::InvalidCategoryCode {
                    row,
                    column: name.clone(),
                    value: column[row],
                });
            }
        }
        self.kinds = kinds;
        Ok(self)
    }

    /// Return a new matrix where every column in `columns` takes the value at
    /// row `order[i]` for row `i`. All other columns are shared with `self`.
    ///
    /// Applying the same `order` to several columns permutes them jointly.
    ///
    /// # Panics
    ///
    /// Panics if `order.len() != self.n_rows()` or if a column or row index is out of bounds.
    #[must_use]
    pub fn with_columns_permuted(&self, columns: &[usize], order: &[usize]) -> Self {
        assert_eq!(order.len(), self.n_rows, "order must cover every row");
        let mut permuted = self.columns.clone();
        for &col in columns {
            let source = &self.columns[col];
            permuted[col] = order.iter().map(|&row| source[row]).collect();
        }
        Self {
            names: self.names.clone(),
            kinds: self.kinds.clone(),
            columns: permuted,
            n_rows: self.n_rows,
        }
    }

    /// Return the number of rows (instances).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Return the column names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the column kinds in order.
    #[must_use]
    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    /// Return the zero-based index of the named column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Borrow column `col`.
    ///
    /// # Panics
    ///
    /// Panics if `col >= self.n_features()`.
    #[must_use]
    pub fn column(&self, col: usize) -> &[f64] {
        &self.columns[col]
    }

    /// Borrow the named column.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.index_of(name).map(|col| self.column(col))
    }

    /// Return the value at (`row`, `col`), or `None` if out of bounds.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col).and_then(|c| c.get(row)).copied()
    }

    /// Copy row `row` into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.n_rows()`.
    #[must_use]
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[row]).collect()
    }

    /// Whether column `col` is stored in the same allocation as `other`'s column `col`.
    #[cfg(test)]
    pub(crate) fn shares_column(&self, other: &Self, col: usize) -> bool {
        Arc::ptr_eq(&self.columns[col], &other.columns[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    fn small() -> FeatureMatrix {
        FeatureMatrix::from_columns(
            names(&["a", "b", "c"]),
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![10.0, 20.0, 30.0, 40.0],
                vec![0.0, 1.0, 0.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn dimensions_and_accessors() {
        let m = small();
        assert_eq!(m.n_rows(), 4);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.index_of("b"), Some(1));
        assert_eq!(m.index_of("z"), None);
        assert_eq!(m.column_by_name("c").unwrap(), &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(m.value(2, 1), Some(30.0));
        assert_eq!(m.value(4, 1), None);
        assert_eq!(m.row(3), vec![4.0, 40.0, 1.0]);
    }

    #[test]
    fn from_rows_matches_from_columns() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let m = FeatureMatrix::from_rows(names(&["a", "b"]), &rows).unwrap();
        assert_eq!(m.column(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.column(1), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn from_rows_rejects_short_row() {
        let rows = vec![vec![1.0, 10.0], vec![2.0]];
        let err = FeatureMatrix::from_rows(names(&["a", "b"]), &rows).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::RaggedRow {
                row: 1,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn permuted_columns_are_new_and_others_shared() {
        let m = small();
        let p = m.with_columns_permuted(&[1], &[3, 2, 1, 0]);
        assert_eq!(p.column(1), &[40.0, 30.0, 20.0, 10.0]);
        assert_eq!(m.column(1), &[10.0, 20.0, 30.0, 40.0], "original untouched");
        assert!(p.shares_column(&m, 0));
        assert!(!p.shares_column(&m, 1));
        assert!(p.shares_column(&m, 2));
    }

    #[test]
    fn joint_permutation_keeps_rows_together() {
        let m = small();
        let p = m.with_columns_permuted(&[0, 1], &[2, 0, 3, 1]);
        for row in 0..4 {
            assert_eq!(p.column(1)[row], p.column(0)[row] * 10.0);
        }
    }

    #[test]
    fn rejects_empty() {
        let err = FeatureMatrix::from_columns(vec![], vec![]).unwrap_err();
        assert!(matches!(err, MatrixError::NoColumns));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = FeatureMatrix::from_columns(names(&["a", "a"]), vec![vec![1.0], vec![2.0]])
            .unwrap_err();
        assert!(matches!(err, MatrixError::DuplicateColumn { name } if name == "a"));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = FeatureMatrix::from_columns(names(&["a", "b"]), vec![vec![1.0, 2.0], vec![2.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            MatrixError::RaggedColumn {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_finite() {
        let err = FeatureMatrix::from_columns(names(&["a"]), vec![vec![1.0, f64::NAN]]).unwrap_err();
        assert!(matches!(err, MatrixError::NonFiniteValue { row: 1, .. }));
    }

    #[test]
    fn categorical_codes_validated() {
        let ok = small().with_kinds(vec![
            FeatureKind::Numeric,
            FeatureKind::Numeric,
            FeatureKind::Categorical,
        ]);
        assert_eq!(ok.unwrap().kinds()[2], FeatureKind::Categorical);

        let bad = FeatureMatrix::from_columns(names(&["x"]), vec![vec![0.0, 1.5]])
            .unwrap()
            .with_kinds(vec![FeatureKind::Categorical])
            .unwrap_err();
        assert!(matches!(bad, MatrixError::InvalidCategoryCode { row: 1, .. }));
    }

    #[test]
    fn kind_count_mismatch() {
        let err = small().with_kinds(vec![FeatureKind::Numeric]).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::KindCountMismatch {
                kinds: 1,
                columns: 3
            }
        ));
    }
}
