//! AutoAI core: tabular data, boosting engine and inference alignment
//!
//! Everything the trainer and the prediction service share lives here.
//!
//! Modules:
//! - `table`: CSV ingestion and the loosely typed column model
//! - `clean`: missing-value imputation
//! - `encoding`: drop-first categorical expansion into the canonical schema
//! - `split`: deterministic train/test partitioning
//! - `gbdt`: histogram GBDT with depth-wise, leaf-wise and oblivious trees
//! - `estimator`: task-aware model wrapper over the engine
//! - `artifact`: atomic persistence of {model, columns}
//! - `inference`: request reindexing against the persisted schema
//! - `logging`: tracing subscriber setup shared by the binaries

pub mod artifact;
pub mod clean;
pub mod deterministic;
pub mod encoding;
pub mod errors;
pub mod estimator;
pub mod gbdt;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod serde_canon;
pub mod split;
pub mod table;
pub mod target;
pub mod task;

pub use artifact::{TrainedArtifact, DEFAULT_ARTIFACT_PATH};
pub use clean::{impute_missing_values, Imputer};
pub use encoding::{encode, EncodedMatrix};
pub use errors::{AutoAiError, Result, TrainingStage};
pub use estimator::{Estimator, ModelFamily};
pub use gbdt::{BoostParams, GrowthPolicy};
pub use inference::{
    align_features, predict, FillPolicy, InferenceAligner, PredictionRequest, PredictionResponse,
};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::EvaluationReport;
pub use split::{split, split_indices, Samples, Split};
pub use table::{Column, ColumnKind, Scalar, Table};
pub use target::{encode_target, EncodedTarget};
pub use task::{detect_task, Task, DEFAULT_REGRESSION_THRESHOLD};

/// Crate version string for reports and health output
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
