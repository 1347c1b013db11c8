//! Learning task and automatic task detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AutoAiError;
use crate::table::{Column, ColumnKind};

/// Default distinct-value count above which a numeric target is regressed
pub const DEFAULT_REGRESSION_THRESHOLD: usize = 10;

/// Supervised learning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Classification,
    Regression,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Classification => "classification",
            Task::Regression => "regression",
        }
    }

    /// Name of the score used for this task
    pub fn metric_name(&self) -> &'static str {
        match self {
            Task::Classification => "accuracy",
            Task::Regression => "r2",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = AutoAiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classification" => Ok(Task::Classification),
            "regression" => Ok(Task::Regression),
            other => Err(AutoAiError::UnsupportedConfiguration(format!(
                "unknown task '{other}'"
            ))),
        }
    }
}

/// Pick a task from the target column.
///
/// A numeric target with more than `threshold` distinct values is a
/// regression target; anything else is classified.
pub fn detect_task(target: &Column, threshold: usize) -> Task {
    if target.kind() == ColumnKind::Numeric && target.distinct_count() > threshold {
        Task::Regression
    } else {
        Task::Classification
    }
}
