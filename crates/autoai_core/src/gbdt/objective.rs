//! Loss functions: gradients, hessians and output transforms
//!
//! Raw scores are laid out output-major: `scores[k][i]` is output `k` for row
//! `i`. Regression and binary objectives have one output; softmax has one per
//! class.

use serde::{Deserialize, Serialize};

const PROB_EPS: f64 = 1e-6;
const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    SquaredError,
    Logistic,
    Softmax { n_classes: usize },
}

impl Objective {
    pub fn n_outputs(&self) -> usize {
        match self {
            Objective::SquaredError | Objective::Logistic => 1,
            Objective::Softmax { n_classes } => *n_classes,
        }
    }

    /// Starting raw score per output
    pub fn base_scores(&self, targets: &[f64]) -> Vec<f64> {
        let n = targets.len().max(1) as f64;
        match self {
            Objective::SquaredError => vec![targets.iter().sum::<f64>() / n],
            Objective::Logistic => {
                let p = (targets.iter().sum::<f64>() / n).clamp(PROB_EPS, 1.0 - PROB_EPS);
                vec![(p / (1.0 - p)).ln()]
            }
            Objective::Softmax { n_classes } => {
                let mut counts = vec![0.0; *n_classes];
                for &t in targets {
                    if let Some(count) = counts.get_mut(t as usize) {
                        *count += 1.0;
                    }
                }
                counts
                    .into_iter()
                    .map(|c| (c / n).clamp(PROB_EPS, 1.0).ln())
                    .collect()
            }
        }
    }

    /// First and second derivatives of the loss, output-major
    pub fn gradients(&self, targets: &[f64], scores: &[Vec<f64>]) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        match self {
            Objective::SquaredError => {
                let grad = scores[0].iter().zip(targets).map(|(p, y)| p - y).collect();
                (vec![grad], vec![vec![1.0; targets.len()]])
            }
            Objective::Logistic => {
                let mut grad = Vec::with_capacity(targets.len());
                let mut hess = Vec::with_capacity(targets.len());
                for (&raw, &y) in scores[0].iter().zip(targets) {
                    let p = sigmoid(raw);
                    grad.push(p - y);
                    hess.push((p * (1.0 - p)).max(MIN_HESSIAN));
                }
                (vec![grad], vec![hess])
            }
            Objective::Softmax { n_classes } => {
                let k = *n_classes;
                let mut grad = vec![Vec::with_capacity(targets.len()); k];
                let mut hess = vec![Vec::with_capacity(targets.len()); k];
                let mut raw = vec![0.0; k];
                for (i, &y) in targets.iter().enumerate() {
                    for (c, slot) in raw.iter_mut().enumerate() {
                        *slot = scores[c][i];
                    }
                    let probs = softmax(&raw);
                    for c in 0..k {
                        let indicator = if y as usize == c { 1.0 } else { 0.0 };
                        grad[c].push(probs[c] - indicator);
                        hess[c].push((2.0 * probs[c] * (1.0 - probs[c])).max(MIN_HESSIAN));
                    }
                }
                (grad, hess)
            }
        }
    }

    /// Class probabilities for one row's raw outputs (regression: identity)
    pub fn transform(&self, raw: &[f64]) -> Vec<f64> {
        match self {
            Objective::SquaredError => raw.to_vec(),
            Objective::Logistic => {
                let p = sigmoid(raw[0]);
                vec![1.0 - p, p]
            }
            Objective::Softmax { .. } => softmax(raw),
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn softmax(raw: &[f64]) -> Vec<f64> {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_error_gradients() {
        let obj = Objective::SquaredError;
        assert_eq!(obj.base_scores(&[1.0, 3.0]), vec![2.0]);
        let (g, h) = obj.gradients(&[1.0, 3.0], &[vec![2.0, 2.0]]);
        assert_eq!(g, vec![vec![1.0, -1.0]]);
        assert_eq!(h, vec![vec![1.0, 1.0]]);
    }

    #[test]
    fn test_logistic_base_score_is_log_odds() {
        let base = Objective::Logistic.base_scores(&[1.0, 1.0, 1.0, 0.0]);
        assert!((base[0] - 3.0f64.ln()).abs() < 1e-12);
        let probs = Objective::Logistic.transform(&base);
        assert!((probs[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_gradients_sum_to_zero() {
        let obj = Objective::Softmax { n_classes: 3 };
        let scores = vec![vec![0.1], vec![0.5], vec![-0.2]];
        let (g, h) = obj.gradients(&[1.0], &scores);
        let total: f64 = g.iter().map(|col| col[0]).sum();
        assert!(total.abs() < 1e-12);
        assert!(g[1][0] < 0.0);
        assert!(h.iter().all(|col| col[0] > 0.0));
    }

    #[test]
    fn test_softmax_is_stable() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }
}
