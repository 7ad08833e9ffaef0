use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use permimp_core::{Execution, ImportanceConfig, LossKind, Method, ScoreMode};
use permimp_io::{DatasetReader, ExperimentName, ResultWriter};
use permimp_linear::LinearRegressionConfig;

#[derive(Parser)]
#[command(name = "permimp")]
#[command(about = "Permutation feature importance for tabular regression models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Score permutations on the calling thread only
    #[arg(long, global = true)]
    sequential: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a linear model on a CSV dataset and rank its features by permutation importance
    Importance {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Target column (defaults to the last column)
        #[arg(long)]
        target: Option<String>,

        /// Loss function: "mae", "mse", "rmse", "ce", or "auc"
        #[arg(long, default_value = "mae")]
        loss: String,

        /// Permutations per feature (ignored by exact-pairs)
        #[arg(long, default_value_t = 1)]
        repetitions: usize,

        /// Permutation method: "shuffle" or "exact-pairs"
        #[arg(long, default_value = "shuffle")]
        method: String,

        /// Score mode: "ratio" or "difference"
        #[arg(long, default_value = "ratio")]
        mode: String,

        /// Comma-separated subset of features to score (defaults to all)
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Comma-separated columns to treat as categorical
        #[arg(long, value_delimiter = ',')]
        categorical: Option<Vec<String>>,

        /// Ridge penalty for the linear model
        #[arg(long, default_value_t = 0.0)]
        l2: f64,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ImportanceOutput {
    experiment: String,
    target: String,
    n_rows: usize,
    loss: String,
    method: Method,
    score_mode: ScoreMode,
    baseline_error: f64,
    features: Vec<FeatureOutput>,
}

#[derive(Serialize)]
struct FeatureOutput {
    name: String,
    rank: usize,
    importance: f64,
    std: f64,
    coefficient: Option<f64>,
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "shuffle" => Ok(Method::Shuffle),
        "exact-pairs" => Ok(Method::ExactPairs),
        other => anyhow::bail!("unknown method: {other} (expected shuffle or exact-pairs)"),
    }
}

fn parse_score_mode(s: &str) -> Result<ScoreMode> {
    match s {
        "ratio" => Ok(ScoreMode::Ratio),
        "difference" => Ok(ScoreMode::Difference),
        other => anyhow::bail!("unknown score mode: {other} (expected ratio or difference)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let execution = if cli.sequential {
        Execution::Sequential
    } else {
        Execution::Parallel
    };

    match cli.command {
        Command::Importance {
            data,
            target,
            loss,
            repetitions,
            method,
            mode,
            features,
            categorical,
            l2,
            experiment,
            output_dir,
        } => {
            let experiment_name =
                ExperimentName::new(experiment.clone()).context("invalid experiment name")?;
            let loss: LossKind = loss.parse().context("invalid --loss")?;
            let method = parse_method(&method)?;
            let score_mode = parse_score_mode(&mode)?;

            let mut reader = DatasetReader::new(&data);
            if let Some(target) = target {
                reader = reader.with_target(target);
            }
            if let Some(columns) = categorical {
                reader = reader.with_categorical(columns);
            }
            let dataset = reader
                .read()
                .with_context(|| format!("failed to read dataset from {}", data.display()))?;

            let linear = LinearRegressionConfig::new().with_l2(l2);
            info!(
                l2 = linear.l2(),
                fit_intercept = linear.fit_intercept(),
                n_rows = dataset.n_rows(),
                "fitting linear model"
            );
            let model = linear
                .fit(&dataset.matrix, &dataset.outcome)
                .context("linear regression fit failed")?;
            info!(
                intercept = model.intercept(),
                n_features = model.coefficients().len(),
                "model fitted"
            );

            let mut config = ImportanceConfig::new(repetitions)
                .context("invalid --repetitions")?
                .with_method(method)
                .with_score_mode(score_mode)
                .with_seed(cli.seed)
                .with_execution(execution);
            if let Some(subset) = features {
                config = config.with_features(subset);
            }
            let table = config
                .compute(&model, &dataset.matrix, &dataset.outcome, &loss)
                .context("permutation importance failed")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)
                .context("failed to create output directory")?;
            writer
                .write_importance(&dataset.target, &table)
                .context("failed to write importance result")?;

            let output = ImportanceOutput {
                experiment,
                target: dataset.target.clone(),
                n_rows: table.n_rows,
                loss: table.loss.clone(),
                method: table.method,
                score_mode: table.score_mode,
                baseline_error: table.baseline_error,
                features: table
                    .records()
                    .iter()
                    .map(|r| FeatureOutput {
                        name: r.name.clone(),
                        rank: r.rank,
                        importance: r.importance,
                        std: r.std,
                        coefficient: model.coefficient(&r.name),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
