//! Evaluation metrics
//!
//! Accuracy and R² are the scores used for model selection and reporting.
//! The fuller [`EvaluationReport`] adds a confusion matrix and per-class
//! scores for classification, or MSE and MAE for regression.

use serde::{Deserialize, Serialize};

use crate::errors::{AutoAiError, Result};
use crate::table::Scalar;
use crate::task::Task;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(AutoAiError::Model(format!(
            "length mismatch: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(AutoAiError::Model("cannot score an empty set".to_string()));
    }
    Ok(())
}

/// Fraction of exact matches between class indices
pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok(sum / y_true.len() as f64)
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(sum / y_true.len() as f64)
}

/// Task score: accuracy for classification, R² for regression
pub fn score(task: Task, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    match task {
        Task::Classification => accuracy(y_true, y_pred),
        Task::Regression => r2_score(y_true, y_pred),
    }
}

/// `matrix[true][predicted]` counts over `n_classes` class indices
pub fn confusion_matrix(y_true: &[f64], y_pred: &[f64], n_classes: usize) -> Result<Vec<Vec<usize>>> {
    check_lengths(y_true, y_pred)?;
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        let (t, p) = (t as usize, p as usize);
        if t >= n_classes || p >= n_classes {
            return Err(AutoAiError::Model(format!(
                "class index out of range for {n_classes} classes"
            )));
        }
        matrix[t][p] += 1;
    }
    Ok(matrix)
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Task-specific evaluation of a model on held-out data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum EvaluationReport {
    Classification {
        accuracy: f64,
        confusion_matrix: Vec<Vec<usize>>,
        per_class: Vec<ClassScores>,
        macro_precision: f64,
        macro_recall: f64,
        macro_f1: f64,
    },
    Regression {
        r2: f64,
        mse: f64,
        mae: f64,
    },
}

impl EvaluationReport {
    pub fn classification(y_true: &[f64], y_pred: &[f64], classes: &[Scalar]) -> Result<Self> {
        let n_classes = classes.len();
        let matrix = confusion_matrix(y_true, y_pred, n_classes)?;

        let per_class: Vec<ClassScores> = classes
            .iter()
            .enumerate()
            .map(|(c, label)| {
                let tp = matrix[c][c] as f64;
                let predicted: usize = matrix.iter().map(|row| row[c]).sum();
                let support: usize = matrix[c].iter().sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                let f1 = ratio(2.0 * precision * recall, precision + recall);
                ClassScores {
                    label: label.key(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let denom = n_classes.max(1) as f64;
        Ok(EvaluationReport::Classification {
            accuracy: accuracy(y_true, y_pred)?,
            macro_precision: per_class.iter().map(|c| c.precision).sum::<f64>() / denom,
            macro_recall: per_class.iter().map(|c| c.recall).sum::<f64>() / denom,
            macro_f1: per_class.iter().map(|c| c.f1).sum::<f64>() / denom,
            confusion_matrix: matrix,
            per_class,
        })
    }

    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        Ok(EvaluationReport::Regression {
            r2: r2_score(y_true, y_pred)?,
            mse: mean_squared_error(y_true, y_pred)?,
            mae: mean_absolute_error(y_true, y_pred)?,
        })
    }

    /// The selection score carried by this report
    pub fn score(&self) -> f64 {
        match self {
            EvaluationReport::Classification { accuracy, .. } => *accuracy,
            EvaluationReport::Regression { r2, .. } => *r2,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let acc = accuracy(&[0.0, 1.0, 1.0, 0.0], &[0.0, 1.0, 0.0, 0.0]).expect("accuracy");
        assert!((acc - 0.75).abs() < 1e-12);
        assert!(accuracy(&[], &[]).is_err());
    }

    #[test]
    fn test_r2() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&y, &y).expect("r2"), 1.0);
        let mean = [2.5; 4];
        assert!(r2_score(&y, &mean).expect("r2").abs() < 1e-12);
        assert_eq!(r2_score(&[3.0, 3.0], &[3.0, 3.0]).expect("r2"), 1.0);
        assert_eq!(r2_score(&[3.0, 3.0], &[2.0, 3.0]).expect("r2"), 0.0);
    }

    #[test]
    fn test_classification_report() {
        let classes = vec![Scalar::from("no"), Scalar::from("yes")];
        let report =
            EvaluationReport::classification(&[0.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 1.0, 1.0], &classes)
                .expect("report");

        match report {
            EvaluationReport::Classification {
                accuracy,
                confusion_matrix,
                per_class,
                ..
            } => {
                assert!((accuracy - 0.75).abs() < 1e-12);
                assert_eq!(confusion_matrix, vec![vec![1, 1], vec![0, 2]]);
                assert_eq!(per_class[0].label, "no");
                assert!((per_class[0].precision - 1.0).abs() < 1e-12);
                assert!((per_class[0].recall - 0.5).abs() < 1e-12);
                assert_eq!(per_class[1].support, 2);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn test_regression_report() {
        let report = EvaluationReport::regression(&[1.0, 3.0], &[2.0, 3.0]).expect("report");
        match report {
            EvaluationReport::Regression { mse, mae, .. } => {
                assert!((mse - 0.5).abs() < 1e-12);
                assert!((mae - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }
}
