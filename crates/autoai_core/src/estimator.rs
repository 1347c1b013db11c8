//! Task-aware model wrapper around the boosting engine

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::errors::{AutoAiError, Result};
use crate::gbdt::{BoostParams, GbdtModel, GrowthPolicy, Objective};
use crate::split::Samples;
use crate::table::Scalar;
use crate::task::Task;

/// Closed set of boosting model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Depth-wise trees
    GradientBoostA,
    /// Leaf-wise trees
    GradientBoostB,
    /// Oblivious trees
    GradientBoostC,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::GradientBoostA,
        ModelFamily::GradientBoostB,
        ModelFamily::GradientBoostC,
    ];

    pub fn growth_policy(&self) -> GrowthPolicy {
        match self {
            ModelFamily::GradientBoostA => GrowthPolicy::DepthWise,
            ModelFamily::GradientBoostB => GrowthPolicy::LeafWise,
            ModelFamily::GradientBoostC => GrowthPolicy::Oblivious,
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::GradientBoostA => "gradient_boost_a",
            ModelFamily::GradientBoostB => "gradient_boost_b",
            ModelFamily::GradientBoostC => "gradient_boost_c",
        };
        f.write_str(name)
    }
}

/// A model of one family for one task, fitted or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    pub family: ModelFamily,
    pub task: Task,
    pub params: BoostParams,
    /// Class labels in index order; empty for regression
    pub classes: Vec<Scalar>,
    pub booster: Option<GbdtModel>,
}

impl Estimator {
    /// Unfitted estimator; the growth policy always follows the family
    pub fn new(family: ModelFamily, task: Task, mut params: BoostParams) -> Self {
        params.growth = family.growth_policy();
        Self {
            family,
            task,
            params,
            classes: Vec::new(),
            booster: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.booster.is_some()
    }

    /// Feature count the fitted model expects
    pub fn n_features(&self) -> Option<usize> {
        self.booster.as_ref().map(|b| b.n_features)
    }

    /// Fit on `samples`; `classes` labels the class indices of a
    /// classification target and is ignored for regression.
    pub fn fit(&mut self, samples: &Samples, classes: &[Scalar]) -> Result<()> {
        let objective = match self.task {
            Task::Regression => Objective::SquaredError,
            Task::Classification => match classes.len() {
                0 | 1 => {
                    return Err(AutoAiError::Model(format!(
                        "classification needs at least 2 classes, got {}",
                        classes.len()
                    )))
                }
                2 => Objective::Logistic,
                n => Objective::Softmax { n_classes: n },
            },
        };

        if self.task == Task::Classification {
            let n_classes = classes.len() as f64;
            if let Some(bad) = samples
                .targets
                .iter()
                .find(|&&t| t < 0.0 || t >= n_classes || t.fract() != 0.0)
            {
                return Err(AutoAiError::Model(format!("invalid class index {bad}")));
            }
        }

        debug!(
            family = %self.family,
            task = %self.task,
            rows = samples.len(),
            features = samples.n_features(),
            "fitting estimator"
        );

        let booster = GbdtModel::train(&samples.rows, &samples.targets, objective, &self.params)?;
        self.classes = match self.task {
            Task::Classification => classes.to_vec(),
            Task::Regression => Vec::new(),
        };
        self.booster = Some(booster);
        Ok(())
    }

    fn booster_for(&self, row: &[f64]) -> Result<&GbdtModel> {
        let booster = self
            .booster
            .as_ref()
            .ok_or_else(|| AutoAiError::PredictionFailed("model is not fitted".to_string()))?;
        if row.len() != booster.n_features {
            return Err(AutoAiError::PredictionFailed(format!(
                "expected {} features, got {}",
                booster.n_features,
                row.len()
            )));
        }
        Ok(booster)
    }

    /// Class probabilities for one row (classification only)
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        if self.task != Task::Classification {
            return Err(AutoAiError::PredictionFailed(
                "probabilities are only defined for classification".to_string(),
            ));
        }
        Ok(self.booster_for(row)?.predict_row(row))
    }

    /// Encoded predictions: class indices, or regression values
    pub fn predict_encoded(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64> {
        let output = self.booster_for(row)?.predict_row(row);
        Ok(match self.task {
            Task::Regression => output[0],
            Task::Classification => argmax(&output) as f64,
        })
    }

    /// Decoded prediction: the class label, or the regression value
    pub fn predict_scalar(&self, row: &[f64]) -> Result<Scalar> {
        let encoded = self.predict_one(row)?;
        match self.task {
            Task::Regression => Ok(Scalar::Number(encoded)),
            Task::Classification => self
                .classes
                .get(encoded as usize)
                .cloned()
                .ok_or_else(|| AutoAiError::PredictionFailed(format!("unknown class index {encoded}"))),
        }
    }
}

/// Index of the largest value; ties keep the lowest index
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}
