//! Deterministic train/test partitioning
//!
//! A seeded Fisher-Yates permutation decides which rows go to the held-out
//! side. The same seed and fraction always give the same partition.

use tracing::debug;

use crate::deterministic::LcgRng;
use crate::errors::{AutoAiError, Result};

/// Feature rows paired with their encoded targets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Samples {
    pub rows: Vec<Vec<f64>>,
    /// Regression values, or class indices for classification
    pub targets: Vec<f64>,
}

impl Samples {
    pub fn new(rows: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        if rows.len() != targets.len() {
            return Err(AutoAiError::Dataset(format!(
                "{} feature rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        if let Some(first) = rows.first() {
            let width = first.len();
            if rows.iter().any(|row| row.len() != width) {
                return Err(AutoAiError::Dataset(
                    "feature rows have inconsistent widths".to_string(),
                ));
            }
        }
        Ok(Self { rows, targets })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Copy of the given rows, in the given order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}

/// Disjoint partitions of a [`Samples`] set
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Samples,
    pub test: Samples,
    /// Positions of the train rows in the input
    pub train_indices: Vec<usize>,
    /// Positions of the test rows in the input
    pub test_indices: Vec<usize>,
}

/// Choose test and train row positions for `n_rows` rows, keeping
/// `train_fraction` of them for training.
///
/// Returns `(train_indices, test_indices)`.
pub fn split_indices(
    n_rows: usize,
    train_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(AutoAiError::Dataset(format!(
            "train fraction must be in (0, 1), got {train_fraction}"
        )));
    }

    let n = n_rows;
    if n < 2 {
        return Err(AutoAiError::Dataset(format!(
            "need at least 2 rows to split, got {n}"
        )));
    }

    // Guard against 0.2 * 10 = 2.0000000000000004 rounding up to 3
    let n_test = ((n as f64 * (1.0 - train_fraction)) - 1e-9).ceil() as usize;
    let n_test = n_test.clamp(1, n - 1);

    let mut permutation = LcgRng::new(seed).permutation(n);
    let train_indices = permutation.split_off(n_test);
    let test_indices = permutation;

    debug!(
        rows = n,
        train = train_indices.len(),
        test = test_indices.len(),
        seed,
        "split rows"
    );

    Ok((train_indices, test_indices))
}

/// Partition `samples`, keeping `train_fraction` of the rows for training.
pub fn split(samples: &Samples, train_fraction: f64, seed: u64) -> Result<Split> {
    let (train_indices, test_indices) = split_indices(samples.len(), train_fraction, seed)?;
    Ok(Split::from_indices(samples, train_indices, test_indices))
}

impl Split {
    /// Partition `samples` by precomputed row positions.
    pub fn from_indices(
        samples: &Samples,
        train_indices: Vec<usize>,
        test_indices: Vec<usize>,
    ) -> Self {
        Split {
            train: samples.subset(&train_indices),
            test: samples.subset(&test_indices),
            train_indices,
            test_indices,
        }
    }
}
