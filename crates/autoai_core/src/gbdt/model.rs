//! Boosted ensemble: training loop and raw scoring

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::binning::BinMapper;
use super::grower::TreeGrower;
use super::objective::Objective;
use super::params::BoostParams;
use super::tree::Tree;
use crate::deterministic::LcgRng;
use crate::errors::{AutoAiError, Result};

/// A fitted gradient-boosted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    pub objective: Objective,
    pub n_features: usize,
    /// Starting raw score per output
    pub base_scores: Vec<f64>,
    /// One tree per output for every boosting round
    pub rounds: Vec<Vec<Tree>>,
}

impl GbdtModel {
    /// Fit an ensemble with `params` against `targets`.
    pub fn train(
        rows: &[Vec<f64>],
        targets: &[f64],
        objective: Objective,
        params: &BoostParams,
    ) -> Result<Self> {
        params.validate()?;
        if rows.is_empty() {
            return Err(AutoAiError::Model("cannot train on zero rows".to_string()));
        }
        if rows.len() != targets.len() {
            return Err(AutoAiError::Model(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let n_rows = rows.len();
        let n_features = rows[0].len();
        let n_outputs = objective.n_outputs();

        let mapper = BinMapper::fit(rows, params.max_bins);
        let binned = mapper.transform(rows);
        let base_scores = objective.base_scores(targets);
        let mut scores: Vec<Vec<f64>> = base_scores.iter().map(|&b| vec![b; n_rows]).collect();

        let mut rng = LcgRng::new(params.seed);
        let mut rounds = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let (grad, hess) = objective.gradients(targets, &scores);
            let sampled_rows = sample_rows(&mut rng, n_rows, params.subsample);
            let features = sample_features(&mut rng, n_features, params.colsample);

            let mut trees = Vec::with_capacity(n_outputs);
            for output in 0..n_outputs {
                let tree = TreeGrower::new(
                    &binned,
                    &mapper,
                    &grad[output],
                    &hess[output],
                    &features,
                    params,
                )
                .grow(&sampled_rows);

                for (score, row) in scores[output].iter_mut().zip(rows) {
                    *score += tree.evaluate(row);
                }
                trees.push(tree);
            }

            debug!(
                round = round + 1,
                rows = sampled_rows.len(),
                features = features.len(),
                "boosting round complete"
            );
            rounds.push(trees);
        }

        Ok(Self {
            objective,
            n_features,
            base_scores,
            rounds,
        })
    }

    /// Raw (untransformed) outputs for one row
    pub fn raw_scores(&self, row: &[f64]) -> Vec<f64> {
        let mut raw = self.base_scores.clone();
        for trees in &self.rounds {
            for (slot, tree) in raw.iter_mut().zip(trees) {
                *slot += tree.evaluate(row);
            }
        }
        raw
    }

    /// Transformed outputs: probabilities, or the regression value
    pub fn predict_row(&self, row: &[f64]) -> Vec<f64> {
        self.objective.transform(&self.raw_scores(row))
    }

    pub fn n_trees(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    /// Check structural consistency of a deserialized model
    pub fn validate(&self) -> std::result::Result<(), String> {
        let n_outputs = self.objective.n_outputs();
        if self.base_scores.len() != n_outputs {
            return Err(format!(
                "{} base scores for {} outputs",
                self.base_scores.len(),
                n_outputs
            ));
        }
        for (round, trees) in self.rounds.iter().enumerate() {
            if trees.len() != n_outputs {
                return Err(format!("round {round} has {} trees", trees.len()));
            }
            for tree in trees {
                tree.validate(self.n_features)
                    .map_err(|err| format!("round {round}: {err}"))?;
            }
        }
        Ok(())
    }
}

fn sample_rows(rng: &mut LcgRng, n_rows: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 {
        return (0..n_rows).collect();
    }
    let rows: Vec<usize> = (0..n_rows).filter(|_| rng.next_unit() < fraction).collect();
    if rows.is_empty() {
        vec![rng.next_range(n_rows)]
    } else {
        rows
    }
}

fn sample_features(rng: &mut LcgRng, n_features: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 || n_features == 0 {
        return (0..n_features).collect();
    }
    let count = ((n_features as f64 * fraction).round() as usize).clamp(1, n_features);
    let mut features = rng.permutation(n_features);
    features.truncate(count);
    features.sort_unstable();
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::params::GrowthPolicy;

    fn linear_rows(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets = rows.iter().map(|r| 2.0 * r[0] + 1.0).collect();
        (rows, targets)
    }

    #[test]
    fn test_regression_fits_training_data() {
        let (rows, targets) = linear_rows(40);
        let model = GbdtModel::train(&rows, &targets, Objective::SquaredError, &BoostParams::default())
            .expect("train");

        assert_eq!(model.n_trees(), 100);
        let mse: f64 = rows
            .iter()
            .zip(&targets)
            .map(|(row, y)| (model.predict_row(row)[0] - y).powi(2))
            .sum::<f64>()
            / rows.len() as f64;
        assert!(mse < 1.0, "mse too high: {mse}");
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_binary_classification_separates_classes() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..30).map(|i| if i >= 15 { 1.0 } else { 0.0 }).collect();
        let model = GbdtModel::train(&rows, &targets, Objective::Logistic, &BoostParams::default())
            .expect("train");

        assert!(model.predict_row(&[2.0])[1] < 0.5);
        assert!(model.predict_row(&[27.0])[1] > 0.5);
    }

    #[test]
    fn test_softmax_one_tree_per_class() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..30).map(|i| (i / 10) as f64).collect();
        let params = BoostParams {
            n_estimators: 20,
            growth: GrowthPolicy::LeafWise,
            max_leaves: Some(4),
            ..BoostParams::default()
        };
        let model = GbdtModel::train(&rows, &targets, Objective::Softmax { n_classes: 3 }, &params)
            .expect("train");

        assert_eq!(model.rounds.len(), 20);
        assert!(model.rounds.iter().all(|trees| trees.len() == 3));
        let probs = model.predict_row(&[25.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(probs[2] > probs[0]);
    }

    #[test]
    fn test_subsampling_is_deterministic() {
        let (rows, targets) = linear_rows(50);
        let params = BoostParams {
            n_estimators: 10,
            subsample: 0.7,
            colsample: 0.5,
            ..BoostParams::default()
        };
        let a = GbdtModel::train(&rows, &targets, Objective::SquaredError, &params).expect("train");
        let b = GbdtModel::train(&rows, &targets, Objective::SquaredError, &params).expect("train");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = GbdtModel::train(&[], &[], Objective::SquaredError, &BoostParams::default());
        assert!(result.is_err());
    }
}
