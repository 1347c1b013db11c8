//! Training pipeline
//!
//! Orchestrates one run: split, impute and encode, optional search, refit
//! on the full training split, evaluate on the test split, optional
//! explanation. Imputation statistics come from the training rows only. The
//! trainer returns an in-memory [`TrainedArtifact`]; persisting it is the
//! caller's step, so a failed run never touches the artifact on disk.

use autoai_core::{
    detect_task, encode, encode_target, split_indices, AutoAiError, Column, EvaluationReport,
    Imputer, Result, Samples, Split, Table, Task, TrainedArtifact, TrainingStage,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::TrainerConfig;
use crate::explain::{Explainer, ExplanationReport, PermutationExplainer};
use crate::registry;
use crate::search::{HyperParams, SearchEngine, Study};

/// Requested task; `Auto` is resolved from the target column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskSelection {
    #[default]
    Auto,
    Classification,
    Regression,
}

impl TaskSelection {
    fn resolve(self, target: &Column, threshold: usize) -> Task {
        match self {
            TaskSelection::Classification => Task::Classification,
            TaskSelection::Regression => Task::Regression,
            TaskSelection::Auto => detect_task(target, threshold),
        }
    }
}

impl fmt::Display for TaskSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSelection::Auto => f.write_str("auto"),
            TaskSelection::Classification => f.write_str("classification"),
            TaskSelection::Regression => f.write_str("regression"),
        }
    }
}

impl FromStr for TaskSelection {
    type Err = AutoAiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(TaskSelection::Auto),
            other => other.parse::<Task>().map(|task| match task {
                Task::Classification => TaskSelection::Classification,
                Task::Regression => TaskSelection::Regression,
            }),
        }
    }
}

/// What to train
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    /// Target column name
    pub target: String,
    pub task: TaskSelection,
    /// Registered family name
    pub family: String,
    /// Run the hyperparameter search instead of using family defaults
    pub tune: bool,
    pub explain: bool,
}

impl TrainRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            task: TaskSelection::Auto,
            family: "xgboost".to_string(),
            tune: false,
            explain: false,
        }
    }

    pub fn with_task(mut self, task: TaskSelection) -> Self {
        self.task = task;
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_tuning(mut self, tune: bool) -> Self {
        self.tune = tune;
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    #[serde(skip_serializing)]
    pub artifact: TrainedArtifact,
    pub task: Task,
    pub family: String,
    /// Accuracy or R² on the test split
    pub test_score: f64,
    pub metric: String,
    pub params: HyperParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study: Option<Study>,
    pub evaluation: EvaluationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ExplanationReport>,
    /// Set when explanation was requested but failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_error: Option<String>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Keep an existing training failure, otherwise attribute `err` to `stage`
fn at(stage: TrainingStage) -> impl Fn(AutoAiError) -> AutoAiError {
    move |err| match err {
        err @ AutoAiError::TrainingFailed { .. } => err,
        other => AutoAiError::training(stage, other),
    }
}

/// Runs the training pipeline
pub struct Trainer {
    config: TrainerConfig,
    explainer: Box<dyn Explainer + Send + Sync>,
}

impl Trainer {
    /// Trainer with the permutation explainer configured from `config`
    pub fn new(config: TrainerConfig) -> Self {
        let explainer = PermutationExplainer::from_config(&config.explain, config.seed);
        Self {
            config,
            explainer: Box::new(explainer),
        }
    }

    pub fn with_explainer(mut self, explainer: impl Explainer + Send + Sync + 'static) -> Self {
        self.explainer = Box::new(explainer);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn train(&self, table: &Table, request: &TrainRequest) -> Result<TrainingOutcome> {
        let started = Instant::now();
        let target = request.target.as_str();

        let missing_target = || {
            AutoAiError::training(
                TrainingStage::Encode,
                format!("target column '{target}' not found"),
            )
        };

        let task = request.task.resolve(
            table.column(target).ok_or_else(missing_target)?,
            self.config.regression_cardinality_threshold,
        );

        let constructor = registry::resolve(task, &request.family)?.with_seed(self.config.seed);
        info!(
            target_column = target,
            task = %task,
            model = constructor.name(),
            requested_task = %request.task,
            rows = table.n_rows(),
            "starting training run"
        );

        // Target first; it is never imputed
        let target_column = table.column(target).ok_or_else(missing_target)?;
        let encoded_target =
            encode_target(target_column, task).map_err(at(TrainingStage::Encode))?;
        let classes = encoded_target.classes;

        // Split
        let (train_indices, test_indices) =
            split_indices(table.n_rows(), 1.0 - self.config.test_fraction, self.config.seed)
                .map_err(at(TrainingStage::Split))?;

        // Encode features, with fill values learned from the train rows only
        let imputed;
        let table = if self.config.impute_missing {
            imputed = Imputer::fit(table, &train_indices, &[target]).apply(table);
            &imputed
        } else {
            table
        };
        let encoded = encode(table, &[target]);
        let columns = encoded.columns.clone();
        let samples =
            Samples::new(encoded.rows, encoded_target.values).map_err(at(TrainingStage::Encode))?;
        info!(features = columns.len(), classes = classes.len(), "encoded dataset");

        let parts = Split::from_indices(&samples, train_indices, test_indices);
        info!(train = parts.train.len(), test = parts.test.len(), "split dataset");

        // Search
        let (params, study) = if request.tune {
            let engine = SearchEngine::new(self.config.search());
            let (params, study) = engine
                .search(&parts.train, &constructor, &classes)
                .map_err(at(TrainingStage::Search))?;
            (params, Some(study))
        } else {
            (constructor.defaults(), None)
        };

        // Refit on the whole training split
        let mut model = constructor.build(&params).map_err(at(TrainingStage::Fit))?;
        model
            .fit(&parts.train, &classes)
            .map_err(at(TrainingStage::Fit))?;

        // Evaluate
        let predictions = model
            .predict_encoded(&parts.test.rows)
            .map_err(at(TrainingStage::Evaluate))?;
        let evaluation = match task {
            Task::Classification => {
                EvaluationReport::classification(&parts.test.targets, &predictions, &classes)
            }
            Task::Regression => EvaluationReport::regression(&parts.test.targets, &predictions),
        }
        .map_err(at(TrainingStage::Evaluate))?;
        let test_score = evaluation.score();
        info!(metric = task.metric_name(), score = test_score, "evaluated on test split");

        let (explanation, explanation_error) = if request.explain {
            match self.explainer.explain(&model, &parts.test, &columns, task) {
                Ok(report) => (Some(report), None),
                Err(err) => {
                    warn!(error = %err, "explanation failed; continuing without it");
                    (None, Some(err.to_string()))
                }
            }
        } else {
            (None, None)
        };

        let artifact = TrainedArtifact::new(model, columns).map_err(at(TrainingStage::Fit))?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training run finished"
        );

        Ok(TrainingOutcome {
            artifact,
            task,
            family: constructor.name().to_string(),
            test_score,
            metric: task.metric_name().to_string(),
            params,
            study,
            evaluation,
            explanation,
            explanation_error,
            train_rows: parts.train.len(),
            test_rows: parts.test.len(),
        })
    }
}
