//! AutoAI trainer - model selection, search and the training pipeline
//!
//! Builds on `autoai-core`: the registry maps a task and a family name to a
//! constructor, the search engine tunes that constructor, and the [`Trainer`]
//! turns a table into a [`autoai_core::TrainedArtifact`].

pub mod config;
pub mod eda;
pub mod explain;
pub mod registry;
pub mod search;
pub mod trainer;

use autoai_core::{Result, Table};
use std::path::Path;

pub use autoai_core::{init_logging, LogFormat, LoggingConfig};
pub use config::{ExplainConfig, TrainerConfig};
pub use eda::{generate_eda_report, profile_table, ColumnProfile, EdaReport};
pub use explain::{Explainer, ExplanationReport, FeatureImportance, PermutationExplainer};
pub use registry::{families, family_names, resolve, resolve_names, ModelConstructor, DEFAULT_SEED};
pub use search::{SamplerKind, SearchConfig, SearchEngine, Study, Trial, TrialState};
pub use trainer::{TaskSelection, TrainRequest, Trainer, TrainingOutcome};

/// Train from a CSV file and write the artifact to `output`, returning the
/// outcome and the artifact digest.
pub fn train_from_csv(
    path: &Path,
    request: &TrainRequest,
    config: TrainerConfig,
    output: &Path,
) -> Result<(TrainingOutcome, String)> {
    let table = Table::from_csv(path)?;
    let outcome = Trainer::new(config).train(&table, request)?;
    let digest = outcome.artifact.save(output)?;
    Ok((outcome, digest))
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
