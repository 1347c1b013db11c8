//! Booster training parameters

use serde::{Deserialize, Serialize};

use crate::errors::{AutoAiError, Result};

/// How each tree is grown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Level by level, recursing until `max_depth`
    DepthWise,
    /// Best-first: always split the leaf with the largest gain, up to `max_leaves`
    LeafWise,
    /// Symmetric: every node of a level shares one split
    Oblivious,
}

/// Engine-level parameters shared by all families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// `None` means unbounded
    pub max_depth: Option<usize>,
    /// Leaf budget for leaf-wise growth
    pub max_leaves: Option<usize>,
    pub min_child_weight: f64,
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values (λ)
    pub reg_lambda: f64,
    /// Minimum loss reduction to split (γ)
    pub min_split_gain: f64,
    /// Row fraction sampled per round
    pub subsample: f64,
    /// Feature fraction sampled per round
    pub colsample: f64,
    pub max_bins: usize,
    pub growth: GrowthPolicy,
    pub seed: u64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(6),
            max_leaves: None,
            min_child_weight: 1.0,
            min_samples_leaf: 1,
            reg_lambda: 1.0,
            min_split_gain: 0.0,
            subsample: 1.0,
            colsample: 1.0,
            max_bins: 256,
            growth: GrowthPolicy::DepthWise,
            seed: 42,
        }
    }
}

impl BoostParams {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(AutoAiError::Model(msg));

        if self.n_estimators == 0 {
            return fail("n_estimators must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return fail(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.colsample > 0.0 && self.colsample <= 1.0) {
            return fail(format!("colsample must be in (0, 1], got {}", self.colsample));
        }
        if self.reg_lambda < 0.0 || self.min_child_weight < 0.0 || self.min_split_gain < 0.0 {
            return fail("regularization terms must be non-negative".to_string());
        }
        if !(2..=u16::MAX as usize).contains(&self.max_bins) {
            return fail(format!("max_bins must be in [2, 65535], got {}", self.max_bins));
        }
        if self.max_leaves.is_some_and(|leaves| leaves < 2) {
            return fail("max_leaves must be at least 2".to_string());
        }
        if self.growth == GrowthPolicy::Oblivious && self.max_depth.is_none() {
            return fail("oblivious trees need a bounded depth".to_string());
        }
        Ok(())
    }
}
