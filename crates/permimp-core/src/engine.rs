//! Permutation importance: baseline, permuted scoring, aggregation, ranking.

use std::collections::HashSet;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::adapter::PredictorAdapter;
use crate::cancel::CancelToken;
use crate::config::{
    Execution, FeatureScope, ImportanceConfig, Method, ScoreMode, validate_repetitions,
};
use crate::error::{ImportanceError, Stage};
use crate::loss::Loss;
use crate::matrix::FeatureMatrix;
use crate::model::Model;
use crate::permute::{draw_order, draws_per_item};
use crate::result::{FeatureImportance, ImportanceTable};

/// One feature or feature group to permute.
#[derive(Debug)]
struct ScopeItem {
    name: String,
    columns: Vec<usize>,
    /// Selects the item's random streams; independent of which other items are in scope.
    key: usize,
}

/// Resolve the configured scope against the matrix columns.
fn resolve_scope(scope: &FeatureScope, matrix: &FeatureMatrix) -> Result<Vec<ScopeItem>, ImportanceError> {
    let single = |col: usize| ScopeItem {
        name: matrix.names()[col].clone(),
        columns: vec![col],
        key: col,
    };
    let lookup = |name: &str| {
        matrix
            .index_of(name)
            .ok_or_else(|| ImportanceError::UnknownFeature {
                name: name.to_string(),
            })
    };

    let items = match scope {
        FeatureScope::All => (0..matrix.n_features()).map(single).collect(),
        FeatureScope::Features(names) => {
            let mut cols = names
                .iter()
                .map(|name| lookup(name.as_str()))
                .collect::<Result<Vec<_>, _>>()?;
            cols.sort_unstable();
            cols.dedup();
            cols.into_iter().map(single).collect()
        }
        FeatureScope::Groups(groups) => {
            let mut seen = HashSet::with_capacity(groups.len());
            let mut items = Vec::with_capacity(groups.len());
            for (position, group) in groups.iter().enumerate() {
                if !seen.insert(group.name.as_str()) {
                    return Err(ImportanceError::DuplicateFeatureGroup {
                        group: group.name.clone(),
                    });
                }
                if group.features.is_empty() {
                    return Err(ImportanceError::EmptyFeatureGroup {
                        group: group.name.clone(),
                    });
                }
                let mut columns = group
                    .features
                    .iter()
                    .map(|name| lookup(name.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                columns.sort_unstable();
                columns.dedup();
                items.push(ScopeItem {
                    name: group.name.clone(),
                    columns,
                    key: matrix.n_features() + position,
                });
            }
            items
        }
    };

    if items.is_empty() {
        return Err(ImportanceError::EmptyFeatureSet);
    }
    Ok(items)
}

/// Compute permutation importance.
///
/// 1. Validate every precondition before the first model call.
/// 2. Score the unmodified matrix once (baseline error).
/// 3. Score every (item, draw) unit, in parallel when configured. Each unit
///    draws its row order from its own seeded stream.
/// 4. Reduce each item's permuted errors in draw order, then rank.
///
/// Any error aborts the whole run; no partial table is returned.
#[instrument(
    skip_all,
    fields(
        n_rows = features.n_rows(),
        n_features = features.n_features(),
        n_repetitions = config.n_repetitions,
        method = ?config.method,
    )
)]
pub(crate) fn compute_importance<M, L>(
    config: &ImportanceConfig,
    model: &M,
    features: &FeatureMatrix,
    outcome: &[f64],
    loss: &L,
    cancel: &CancelToken,
) -> Result<ImportanceTable, ImportanceError>
where
    M: Model + ?Sized,
    L: Loss + ?Sized,
{
    // --- Validate inputs ---
    validate_repetitions(config.n_repetitions)?;
    let n_rows = features.n_rows();
    if outcome.len() != n_rows {
        return Err(ImportanceError::OutcomeLengthMismatch {
            n_rows,
            n_outcomes: outcome.len(),
        });
    }
    if n_rows < 2 {
        return Err(ImportanceError::DegenerateDataset { n_rows });
    }
    let items = resolve_scope(&config.features, features)?;

    let adapter = PredictorAdapter::new(model, outcome, loss);
    adapter
        .check_schema(features)
        .map_err(|mismatch| ImportanceError::InvalidSchema {
            stage: Stage::Baseline,
            mismatch,
        })?;

    // --- Baseline ---
    if cancel.is_cancelled() {
        return Err(ImportanceError::Cancelled);
    }
    let baseline_error = adapter
        .score(features)
        .map_err(|e| e.at(Stage::Baseline))?;
    if config.score_mode == ScoreMode::Ratio && baseline_error == 0.0 {
        return Err(ImportanceError::ZeroBaseline {
            loss: loss.name().to_string(),
        });
    }

    let n_draws = draws_per_item(config.method, config.n_repetitions, n_rows);
    info!(
        baseline_error,
        loss = loss.name(),
        n_items = items.len(),
        n_draws,
        concurrent_safe = model.concurrent_safe(),
        "computing permutation importance"
    );

    // --- Permuted scoring ---
    let units: Vec<(usize, usize)> = (0..items.len())
        .flat_map(|item| (0..n_draws).map(move |draw| (item, draw)))
        .collect();

    let method = config.method;
    let seed = config.seed;
    let score_unit = |&(item_idx, draw): &(usize, usize)| -> Result<f64, ImportanceError> {
        if cancel.is_cancelled() {
            return Err(ImportanceError::Cancelled);
        }
        let item = &items[item_idx];
        let order = draw_order(method, n_rows, seed, item.key, draw);
        let permuted = features.with_columns_permuted(&item.columns, &order);
        adapter.score(&permuted).map_err(|e| {
            e.at(Stage::Permuted {
                feature: item.name.clone(),
                repetition: draw,
            })
        })
    };

    // Collected in unit order: errors[item * n_draws + draw].
    let permuted_errors: Vec<f64> = match config.execution {
        Execution::Parallel => units
            .par_iter()
            .map(score_unit)
            .collect::<Result<Vec<_>, _>>()?,
        Execution::Sequential => units
            .iter()
            .map(score_unit)
            .collect::<Result<Vec<_>, _>>()?,
    };

    // --- Aggregate ---
    let records: Vec<FeatureImportance> = items
        .into_iter()
        .zip(permuted_errors.chunks(n_draws))
        .map(|(item, errors)| {
            let names = item
                .columns
                .iter()
                .map(|&col| features.names()[col].clone())
                .collect();
            let record = FeatureImportance::from_errors(
                item.name,
                names,
                errors,
                baseline_error,
                config.score_mode,
            );
            debug!(
                feature = %record.name,
                importance = record.importance,
                std = record.std,
                "feature scored"
            );
            record
        })
        .collect();

    let table = ImportanceTable::ranked(
        records,
        baseline_error,
        loss.name().to_string(),
        method,
        config.score_mode,
        n_rows,
        n_draws,
        seed,
    );

    info!(
        top_feature = table.records().first().map(|r| r.name.as_str()),
        top_importance = table.records().first().map(|r| r.importance),
        "permutation importance complete"
    );

    Ok(table)
}

/// Compute permutation importance with every configuration parameter spelled out.
///
/// Equivalent to building an [`ImportanceConfig`] and calling
/// [`ImportanceConfig::compute`]; a `None` feature subset scores every column.
///
/// # Errors
///
/// See [`ImportanceConfig::compute`], plus
/// [`ImportanceError::InvalidRepetitions`] when `n_repetitions` is zero.
#[allow(clippy::too_many_arguments)]
pub fn compute<M, L>(
    model: &M,
    features: &FeatureMatrix,
    outcome: &[f64],
    loss: &L,
    n_repetitions: usize,
    method: Method,
    score_mode: ScoreMode,
    feature_subset: Option<&[String]>,
    seed: u64,
) -> Result<ImportanceTable, ImportanceError>
where
    M: Model + ?Sized,
    L: Loss + ?Sized,
{
    let scope = feature_subset.map_or(FeatureScope::All, |names| {
        FeatureScope::Features(names.to_vec())
    });
    ImportanceConfig::new(n_repetitions)?
        .with_method(method)
        .with_score_mode(score_mode)
        .with_scope(scope)
        .with_seed(seed)
        .compute(model, features, outcome, loss)
}
