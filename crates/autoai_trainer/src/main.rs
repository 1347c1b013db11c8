//! AutoAI trainer CLI
//!
//! Trains one model family on a CSV dataset, prints the evaluation and
//! writes the artifact the prediction service loads.

use anyhow::{Context, Result};
use autoai_core::Table;
use autoai_trainer::{
    generate_eda_report, init_logging, TaskSelection, TrainRequest, Trainer, TrainerConfig,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "autoai-train")]
#[command(author = "AutoAI Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate a gradient-boosted model on a CSV dataset", long_about = None)]
struct Args {
    /// Input CSV dataset
    #[arg(short, long)]
    data: PathBuf,

    /// Target column name
    #[arg(short, long)]
    target: String,

    /// Task type; `auto` infers it from the target column
    #[arg(long, value_enum, default_value_t = TaskSelection::Auto)]
    task: TaskSelection,

    /// Model family (xgboost, lightgbm, catboost)
    #[arg(short, long, default_value = "xgboost")]
    model: String,

    /// Run the hyperparameter search
    #[arg(long)]
    tune: bool,

    /// Compute permutation feature importance
    #[arg(long)]
    explain: bool,

    /// Write a descriptive statistics report to this path
    #[arg(long)]
    eda_report: Option<PathBuf>,

    /// Artifact output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of search trials
    #[arg(long)]
    trials: Option<usize>,

    /// Random seed for splitting, sampling and the engine
    #[arg(long)]
    seed: Option<u64>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TrainerConfig::load(args.config.as_deref())?;
    if let Some(trials) = args.trials {
        config.n_trials = trials;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(output) = &args.output {
        config.artifact_path = output.clone();
    }
    config.validate()?;

    init_logging(&config.logging, args.verbose).context("Failed to set tracing subscriber")?;
    info!("AutoAI trainer v{}", env!("CARGO_PKG_VERSION"));

    info!("Loading dataset from: {}", args.data.display());
    let table = Table::from_csv(&args.data)
        .with_context(|| format!("Failed to load dataset {}", args.data.display()))?;
    info!(
        "Loaded {} rows with {} columns",
        table.n_rows(),
        table.n_columns()
    );

    if let Some(path) = &args.eda_report {
        if let Err(err) = generate_eda_report(&table, path) {
            warn!("EDA report failed: {err}");
        }
    }

    let request = TrainRequest::new(args.target)
        .with_task(args.task)
        .with_family(args.model)
        .with_tuning(args.tune)
        .with_explain(args.explain);

    let artifact_path = config.artifact_path.clone();
    let outcome = Trainer::new(config)
        .train(&table, &request)
        .context("Training failed")?;

    let summary =
        serde_json::to_string_pretty(&outcome).context("Failed to render training summary")?;
    println!("{summary}");

    let digest = outcome
        .artifact
        .save(&artifact_path)
        .with_context(|| format!("Failed to save artifact to {}", artifact_path.display()))?;

    info!("Artifact saved to: {}", artifact_path.display());
    info!("Artifact hash: {}", digest);
    info!(
        "{} on test split: {:.4}",
        outcome.metric, outcome.test_score
    );

    Ok(())
}
