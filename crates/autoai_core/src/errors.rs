//! Error types for the AutoAI core

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a training run was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStage {
    Encode,
    Split,
    Search,
    Fit,
    Evaluate,
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TrainingStage::Encode => "encode",
            TrainingStage::Split => "split",
            TrainingStage::Search => "search",
            TrainingStage::Fit => "fit",
            TrainingStage::Evaluate => "evaluate",
        };
        f.write_str(value)
    }
}

/// Errors that can occur across training and serving
#[derive(Error, Debug)]
pub enum AutoAiError {
    /// Unknown task or model family
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Training run aborted; no artifact is produced
    #[error("Training failed during {stage}: {reason}")]
    TrainingFailed { stage: TrainingStage, reason: String },

    /// Explainability step failed (non-fatal for training)
    #[error("Explainability failed: {0}")]
    ExplainabilityFailed(String),

    /// No persisted artifact yet; train and retry
    #[error("Model artifact not found at {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// Artifact exists but cannot be used
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// Aligned-feature prediction failed
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Malformed or unusable dataset
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Model fitting or parameter error
    #[error("Model error: {0}")]
    Model(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AutoAiError {
    /// Wrap any failure as a training failure at the given stage.
    pub fn training(stage: TrainingStage, cause: impl fmt::Display) -> Self {
        AutoAiError::TrainingFailed {
            stage,
            reason: cause.to_string(),
        }
    }

    /// Whether the caller may succeed by retrying after fixing a precondition.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AutoAiError::ArtifactNotFound { .. })
    }
}

/// Result type for AutoAI core operations
pub type Result<T> = std::result::Result<T, AutoAiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_failure_carries_stage_and_cause() {
        let err = AutoAiError::training(TrainingStage::Fit, "target has a single class");
        assert_eq!(
            err.to_string(),
            "Training failed during fit: target has a single class"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_artifact_is_retryable() {
        let err = AutoAiError::ArtifactNotFound {
            path: PathBuf::from("trained_model.json"),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("trained_model.json"));
    }
}
