//! Target column encoding

use std::collections::BTreeMap;

use crate::errors::{AutoAiError, Result};
use crate::table::{Column, Scalar};
use crate::task::Task;

/// Numeric target vector plus the class labels it indexes
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTarget {
    pub values: Vec<f64>,
    /// Class labels ordered by key; empty for regression
    pub classes: Vec<Scalar>,
}

/// Encode `target` for `task`.
///
/// Regression requires every cell to be numeric. Classification maps each
/// label to its index among the sorted distinct labels. Missing cells are
/// rejected in both cases.
pub fn encode_target(target: &Column, task: Task) -> Result<EncodedTarget> {
    if let Some(row) = target.values.iter().position(Option::is_none) {
        return Err(AutoAiError::Dataset(format!(
            "target '{}' is missing at row {row}",
            target.name
        )));
    }

    match task {
        Task::Regression => {
            let values = target
                .values
                .iter()
                .flatten()
                .map(|value| {
                    value.as_f64().ok_or_else(|| {
                        AutoAiError::Dataset(format!(
                            "regression target '{}' has non-numeric value '{value}'",
                            target.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(EncodedTarget {
                values,
                classes: Vec::new(),
            })
        }
        Task::Classification => {
            let mut labels: BTreeMap<String, Scalar> = BTreeMap::new();
            for value in target.values.iter().flatten() {
                labels.entry(value.key()).or_insert_with(|| value.clone());
            }
            let index: BTreeMap<&str, usize> = labels
                .keys()
                .enumerate()
                .map(|(i, key)| (key.as_str(), i))
                .collect();

            let values = target
                .values
                .iter()
                .flatten()
                .map(|value| index[value.key().as_str()] as f64)
                .collect();
            let classes = labels.values().cloned().collect();
            Ok(EncodedTarget { values, classes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_indices_follow_sorted_labels() {
        let column = Column::text("churn", &["yes", "no", "yes", "maybe"]);
        let encoded = encode_target(&column, Task::Classification).expect("encode");
        assert_eq!(
            encoded.classes,
            vec![Scalar::from("maybe"), Scalar::from("no"), Scalar::from("yes")]
        );
        assert_eq!(encoded.values, vec![2.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_regression_values_pass_through() {
        let column = Column::numeric("price", &[1.5, 2.5]);
        let encoded = encode_target(&column, Task::Regression).expect("encode");
        assert_eq!(encoded.values, vec![1.5, 2.5]);
        assert!(encoded.classes.is_empty());
    }

    #[test]
    fn test_missing_and_text_targets_rejected() {
        let missing = Column::new("y", vec![Some(Scalar::Number(1.0)), None]);
        assert!(encode_target(&missing, Task::Classification).is_err());

        let text = Column::text("y", &["a", "b"]);
        assert!(encode_target(&text, Task::Regression).is_err());
    }
}
