//! Feature attribution
//!
//! The default [`PermutationExplainer`] measures how much the held-out score
//! drops when one encoded column is shuffled, repeated with seeded shuffles,
//! and writes the ranking as JSON.

use autoai_core::metrics::score;
use autoai_core::{AutoAiError, Estimator, Result, Samples, Task};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::ExplainConfig;

/// Importance of one encoded column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Mean score drop over the repeats
    pub importance_mean: f64,
    pub importance_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationReport {
    /// Score the importances are measured in
    pub metric: String,
    pub baseline_score: f64,
    /// Most important first
    pub importances: Vec<FeatureImportance>,
    pub n_repeats: usize,
    pub n_rows: usize,
    pub generated_at: DateTime<Utc>,
}

/// Attribution over a fitted model and labelled rows
pub trait Explainer {
    fn explain(
        &self,
        model: &Estimator,
        samples: &Samples,
        columns: &[String],
        task: Task,
    ) -> Result<ExplanationReport>;
}

/// Permutation importance
#[derive(Debug, Clone)]
pub struct PermutationExplainer {
    pub n_repeats: usize,
    pub max_rows: usize,
    pub seed: u64,
    /// Where the report is written; `None` keeps it in memory only
    pub output_path: Option<PathBuf>,
}

impl PermutationExplainer {
    pub fn from_config(config: &ExplainConfig, seed: u64) -> Self {
        Self {
            n_repeats: config.n_repeats,
            max_rows: config.max_rows,
            seed,
            output_path: Some(config.output_path.clone()),
        }
    }

    fn score_rows(model: &Estimator, rows: &[Vec<f64>], targets: &[f64], task: Task) -> Result<f64> {
        let predictions = model.predict_encoded(rows)?;
        score(task, targets, &predictions)
    }

    fn measure(
        &self,
        model: &Estimator,
        samples: &Samples,
        columns: &[String],
        task: Task,
    ) -> Result<ExplanationReport> {
        if samples.is_empty() {
            return Err(AutoAiError::ExplainabilityFailed(
                "no rows to explain".to_string(),
            ));
        }
        if columns.len() != samples.n_features() {
            return Err(AutoAiError::ExplainabilityFailed(format!(
                "{} column names for {} features",
                columns.len(),
                samples.n_features()
            )));
        }

        let n_rows = samples.len().min(self.max_rows.max(1));
        let rows = &samples.rows[..n_rows];
        let targets = &samples.targets[..n_rows];
        let baseline = Self::score_rows(model, rows, targets, task)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut permuted: Vec<Vec<f64>> = rows.to_vec();
        let mut importances = Vec::with_capacity(columns.len());

        for (j, feature) in columns.iter().enumerate() {
            let original: Vec<f64> = rows.iter().map(|row| row[j]).collect();
            let mut drops = Vec::with_capacity(self.n_repeats);

            for _ in 0..self.n_repeats {
                let mut column = original.clone();
                column.shuffle(&mut rng);
                for (row, value) in permuted.iter_mut().zip(&column) {
                    row[j] = *value;
                }
                drops.push(baseline - Self::score_rows(model, &permuted, targets, task)?);
            }

            for (row, value) in permuted.iter_mut().zip(&original) {
                row[j] = *value;
            }

            let (mean, std) = mean_std(&drops);
            debug!(feature = %feature, importance = mean, "permutation importance");
            importances.push(FeatureImportance {
                feature: feature.clone(),
                importance_mean: mean,
                importance_std: std,
            });
        }

        importances.sort_by(|a, b| b.importance_mean.total_cmp(&a.importance_mean));

        Ok(ExplanationReport {
            metric: task.metric_name().to_string(),
            baseline_score: baseline,
            importances,
            n_repeats: self.n_repeats,
            n_rows,
            generated_at: Utc::now(),
        })
    }
}

impl Explainer for PermutationExplainer {
    fn explain(
        &self,
        model: &Estimator,
        samples: &Samples,
        columns: &[String],
        task: Task,
    ) -> Result<ExplanationReport> {
        let report = self
            .measure(model, samples, columns, task)
            .map_err(|err| match err {
                AutoAiError::ExplainabilityFailed(_) => err,
                other => AutoAiError::ExplainabilityFailed(other.to_string()),
            })?;

        if let Some(path) = &self.output_path {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|err| AutoAiError::ExplainabilityFailed(err.to_string()))?;
            fs::write(path, json).map_err(|err| {
                AutoAiError::ExplainabilityFailed(format!("cannot write {}: {err}", path.display()))
            })?;
            info!(path = %path.display(), "feature importance written");
        }
        Ok(report)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
