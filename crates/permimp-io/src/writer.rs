//! JSON result writer for importance tables.

use std::fs;
use std::path::{Path, PathBuf};

use permimp_core::ImportanceTable;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes importance results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_importance.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the path of the importance artifact.
    #[must_use]
    pub fn importance_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_importance.json", self.experiment.as_str()))
    }

    /// Write an importance table to `{experiment}_importance.json` and return its path.
    ///
    /// `target` names the outcome column the table was computed against.
    /// Non-finite statistics (an infinite ratio over a subnormal baseline) are
    /// written as JSON `null`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The table cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(n_records = table.len()))]
    pub fn write_importance(&self, target: &str, table: &ImportanceTable) -> Result<PathBuf, IoError> {
        let path = self.importance_path();

        let artifact = ImportanceArtifact {
            experiment: self.experiment.as_str(),
            target,
            n_features: table.len(),
            table,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "importance result written");
        Ok(path)
    }
}

// --- Shadow struct for JSON serialization ---

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    experiment: &'a str,
    target: &'a str,
    n_features: usize,
    #[serde(flatten)]
    table: &'a ImportanceTable,
}
