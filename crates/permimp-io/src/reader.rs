//! CSV dataset reader with full input validation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use permimp_core::{FeatureKind, FeatureMatrix};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::Dataset;

/// Reads a feature table and its target column from a CSV file.
///
/// Expected CSV format:
/// - Header row required; it names every column
/// - One column is the target (the last column unless [`with_target`](Self::with_target) says otherwise)
/// - All rows have the same number of columns, with no empty cells
///
/// Target values must be finite numbers. A feature column whose cells all
/// parse as numbers is numeric; a column with any non-numeric cell is
/// categorical and its labels are coded `0, 1, ...` in order of first
/// appearance.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::TargetNotFound`] | Target column is not in the header |
/// | [`IoError::NoFeatureColumns`] | Header has no column besides the target |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingValue`] | A cell is empty |
/// | [`IoError::NonFiniteValue`] | Numeric cell is NaN or Inf, or target cell is not a number |
/// | [`IoError::Matrix`] | Columns do not form a valid matrix (e.g. duplicate names) |
pub struct DatasetReader {
    path: PathBuf,
    target: Option<String>,
    categorical: HashSet<String>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            target: None,
            categorical: HashSet::new(),
        }
    }

    /// Use the named column as the target instead of the last column.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Treat the named columns as categorical even if every cell is numeric.
    #[must_use]
    pub fn with_categorical<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.categorical = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our own InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        let target_idx = match &self.target {
            Some(name) => header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IoError::TargetNotFound {
                    path: self.path.clone(),
                    target: name.clone(),
                })?,
            None => header.len().checked_sub(1).ok_or_else(|| IoError::NoFeatureColumns {
                path: self.path.clone(),
            })?,
        };
        if header.len() < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        debug!(n_columns = header.len(), target = %header[target_idx], "read CSV header");

        let mut rows: Vec<csv::StringRecord> = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != header.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: header.len(),
                    got: record.len(),
                });
            }
            if let Some(col) = record.iter().position(str::is_empty) {
                return Err(IoError::MissingValue {
                    path: self.path.clone(),
                    row_index,
                    column: header[col].clone(),
                });
            }
            rows.push(record);
        }
        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let outcome = rows
            .iter()
            .enumerate()
            .map(|(row_index, record)| {
                let raw = &record[target_idx];
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(self.non_finite(row_index, &header[target_idx], raw)),
                }
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let mut names = Vec::with_capacity(header.len() - 1);
        let mut kinds = Vec::with_capacity(header.len() - 1);
        let mut columns = Vec::with_capacity(header.len() - 1);
        let mut categories = BTreeMap::new();
        for (col, name) in header.iter().enumerate() {
            if col == target_idx {
                continue;
            }
            let forced = self.categorical.contains(name);
            let numeric = !forced && rows.iter().all(|r| r[col].parse::<f64>().is_ok());
            if numeric {
                columns.push(self.parse_numeric(&rows, col, name)?);
                kinds.push(FeatureKind::Numeric);
            } else {
                let (codes, levels) = encode_categorical(&rows, col);
                debug!(column = %name, n_levels = levels.len(), "encoded categorical column");
                columns.push(codes);
                kinds.push(FeatureKind::Categorical);
                categories.insert(name.clone(), levels);
            }
            names.push(name.clone());
        }

        let matrix = FeatureMatrix::from_columns(names, columns)
            .and_then(|m| m.with_kinds(kinds))
            .map_err(|source| IoError::Matrix {
                path: self.path.clone(),
                source,
            })?;

        info!(
            n_rows = matrix.n_rows(),
            n_features = matrix.n_features(),
            n_categorical = categories.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            matrix,
            outcome,
            target: header[target_idx].clone(),
            categories,
        })
    }

    fn parse_numeric(&self, rows: &[csv::StringRecord], col: usize, name: &str) -> Result<Vec<f64>, IoError> {
        rows.iter()
            .enumerate()
            .map(|(row_index, record)| {
                let raw = &record[col];
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(self.non_finite(row_index, name, raw)),
                }
            })
            .collect()
    }

    fn non_finite(&self, row_index: usize, column: &str, raw: &str) -> IoError {
        IoError::NonFiniteValue {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Code the labels of column `col` by order of first appearance.
fn encode_categorical(rows: &[csv::StringRecord], col: usize) -> (Vec<f64>, Vec<String>) {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut levels = Vec::new();
    let codes = rows
        .iter()
        .map(|record| {
            let label = &record[col];
            let code = *index.entry(label).or_insert_with(|| {
                levels.push(label.to_string());
                levels.len() - 1
            });
            code as f64
        })
        .collect();
    (codes, levels)
}
