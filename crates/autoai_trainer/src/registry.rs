//! Model family registry
//!
//! Each family is described by one static table: its registered name, base
//! engine parameters, and a list of named parameters. Every parameter knows
//! how to write itself into [`BoostParams`], how to read its default back,
//! and optionally the domain it is searched over. Defaults, search spaces and
//! the mapping of suggested values all come from these tables.

use autoai_core::{AutoAiError, BoostParams, Estimator, GrowthPolicy, ModelFamily, Result, Task};

use crate::search::space::{HyperParams, ParamDomain, ParamValue, SearchSpace};

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 42;

/// One named hyperparameter of a family
pub struct ParamSpec {
    pub name: &'static str,
    /// Search domain; `None` keeps the parameter fixed at its default
    pub domain: Option<ParamDomain>,
    apply: fn(&mut BoostParams, ParamValue),
    read: fn(&BoostParams) -> ParamValue,
}

/// A registered model family
pub struct FamilySpec {
    pub family: ModelFamily,
    pub name: &'static str,
    base: fn() -> BoostParams,
    pub params: &'static [ParamSpec],
}

impl FamilySpec {
    fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

fn int(value: usize) -> ParamValue {
    ParamValue::Int(value as i64)
}

/// `-1` (or any non-positive value) means no limit
fn optional_limit(value: ParamValue) -> Option<usize> {
    let v = value.as_i64();
    (v > 0).then_some(v as usize)
}

fn limit_value(limit: Option<usize>) -> ParamValue {
    limit.map_or(ParamValue::Int(-1), int)
}

const LEARNING_RATE: ParamDomain = ParamDomain::Float {
    low: 0.01,
    high: 0.3,
    log: true,
};

const XGBOOST_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "n_estimators",
        domain: Some(ParamDomain::Int { low: 50, high: 300 }),
        apply: |p, v| p.n_estimators = v.as_usize(),
        read: |p| int(p.n_estimators),
    },
    ParamSpec {
        name: "max_depth",
        domain: Some(ParamDomain::Int { low: 3, high: 10 }),
        apply: |p, v| p.max_depth = optional_limit(v),
        read: |p| limit_value(p.max_depth),
    },
    ParamSpec {
        name: "learning_rate",
        domain: Some(LEARNING_RATE),
        apply: |p, v| p.learning_rate = v.as_f64(),
        read: |p| ParamValue::Float(p.learning_rate),
    },
    ParamSpec {
        name: "subsample",
        domain: Some(ParamDomain::Float {
            low: 0.6,
            high: 1.0,
            log: false,
        }),
        apply: |p, v| p.subsample = v.as_f64(),
        read: |p| ParamValue::Float(p.subsample),
    },
    ParamSpec {
        name: "colsample_bytree",
        domain: None,
        apply: |p, v| p.colsample = v.as_f64(),
        read: |p| ParamValue::Float(p.colsample),
    },
    ParamSpec {
        name: "reg_lambda",
        domain: Some(ParamDomain::Float {
            low: 1e-3,
            high: 10.0,
            log: true,
        }),
        apply: |p, v| p.reg_lambda = v.as_f64(),
        read: |p| ParamValue::Float(p.reg_lambda),
    },
    ParamSpec {
        name: "min_child_weight",
        domain: None,
        apply: |p, v| p.min_child_weight = v.as_f64(),
        read: |p| ParamValue::Float(p.min_child_weight),
    },
    ParamSpec {
        name: "gamma",
        domain: None,
        apply: |p, v| p.min_split_gain = v.as_f64(),
        read: |p| ParamValue::Float(p.min_split_gain),
    },
];

const LIGHTGBM_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "n_estimators",
        domain: Some(ParamDomain::Int { low: 50, high: 300 }),
        apply: |p, v| p.n_estimators = v.as_usize(),
        read: |p| int(p.n_estimators),
    },
    ParamSpec {
        name: "num_leaves",
        domain: Some(ParamDomain::Int { low: 8, high: 128 }),
        apply: |p, v| p.max_leaves = optional_limit(v),
        read: |p| limit_value(p.max_leaves),
    },
    ParamSpec {
        name: "max_depth",
        domain: None,
        apply: |p, v| p.max_depth = optional_limit(v),
        read: |p| limit_value(p.max_depth),
    },
    ParamSpec {
        name: "learning_rate",
        domain: Some(LEARNING_RATE),
        apply: |p, v| p.learning_rate = v.as_f64(),
        read: |p| ParamValue::Float(p.learning_rate),
    },
    ParamSpec {
        name: "min_child_samples",
        domain: Some(ParamDomain::Int { low: 5, high: 50 }),
        apply: |p, v| p.min_samples_leaf = v.as_usize(),
        read: |p| int(p.min_samples_leaf),
    },
    ParamSpec {
        name: "feature_fraction",
        domain: Some(ParamDomain::Float {
            low: 0.6,
            high: 1.0,
            log: false,
        }),
        apply: |p, v| p.colsample = v.as_f64(),
        read: |p| ParamValue::Float(p.colsample),
    },
    ParamSpec {
        name: "bagging_fraction",
        domain: None,
        apply: |p, v| p.subsample = v.as_f64(),
        read: |p| ParamValue::Float(p.subsample),
    },
    ParamSpec {
        name: "lambda_l2",
        domain: None,
        apply: |p, v| p.reg_lambda = v.as_f64(),
        read: |p| ParamValue::Float(p.reg_lambda),
    },
    ParamSpec {
        name: "min_child_weight",
        domain: None,
        apply: |p, v| p.min_child_weight = v.as_f64(),
        read: |p| ParamValue::Float(p.min_child_weight),
    },
];

const CATBOOST_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "iterations",
        domain: Some(ParamDomain::Int { low: 100, high: 1000 }),
        apply: |p, v| p.n_estimators = v.as_usize(),
        read: |p| int(p.n_estimators),
    },
    ParamSpec {
        name: "depth",
        domain: Some(ParamDomain::Int { low: 4, high: 10 }),
        apply: |p, v| p.max_depth = Some(v.as_usize()),
        read: |p| limit_value(p.max_depth),
    },
    ParamSpec {
        name: "learning_rate",
        domain: Some(LEARNING_RATE),
        apply: |p, v| p.learning_rate = v.as_f64(),
        read: |p| ParamValue::Float(p.learning_rate),
    },
    ParamSpec {
        name: "l2_leaf_reg",
        domain: Some(ParamDomain::Float {
            low: 1.0,
            high: 10.0,
            log: true,
        }),
        apply: |p, v| p.reg_lambda = v.as_f64(),
        read: |p| ParamValue::Float(p.reg_lambda),
    },
    ParamSpec {
        name: "rsm",
        domain: None,
        apply: |p, v| p.colsample = v.as_f64(),
        read: |p| ParamValue::Float(p.colsample),
    },
];

fn xgboost_base() -> BoostParams {
    BoostParams {
        n_estimators: 100,
        learning_rate: 0.3,
        max_depth: Some(6),
        max_leaves: None,
        min_child_weight: 1.0,
        min_samples_leaf: 1,
        reg_lambda: 1.0,
        min_split_gain: 0.0,
        subsample: 1.0,
        colsample: 1.0,
        growth: GrowthPolicy::DepthWise,
        ..BoostParams::default()
    }
}

fn lightgbm_base() -> BoostParams {
    BoostParams {
        n_estimators: 100,
        learning_rate: 0.1,
        max_depth: None,
        max_leaves: Some(31),
        min_child_weight: 1e-3,
        min_samples_leaf: 20,
        reg_lambda: 0.0,
        min_split_gain: 0.0,
        subsample: 1.0,
        colsample: 1.0,
        growth: GrowthPolicy::LeafWise,
        ..BoostParams::default()
    }
}

fn catboost_base() -> BoostParams {
    BoostParams {
        n_estimators: 1000,
        learning_rate: 0.03,
        max_depth: Some(6),
        max_leaves: None,
        min_child_weight: 0.0,
        min_samples_leaf: 1,
        reg_lambda: 3.0,
        min_split_gain: 0.0,
        subsample: 1.0,
        colsample: 1.0,
        growth: GrowthPolicy::Oblivious,
        ..BoostParams::default()
    }
}

static FAMILIES: [FamilySpec; 3] = [
    FamilySpec {
        family: ModelFamily::GradientBoostA,
        name: "xgboost",
        base: xgboost_base,
        params: XGBOOST_PARAMS,
    },
    FamilySpec {
        family: ModelFamily::GradientBoostB,
        name: "lightgbm",
        base: lightgbm_base,
        params: LIGHTGBM_PARAMS,
    },
    FamilySpec {
        family: ModelFamily::GradientBoostC,
        name: "catboost",
        base: catboost_base,
        params: CATBOOST_PARAMS,
    },
];

/// All registered families
pub fn families() -> &'static [FamilySpec] {
    &FAMILIES
}

/// Registered names, for error messages and help text
pub fn family_names() -> Vec<&'static str> {
    FAMILIES.iter().map(|f| f.name).collect()
}

/// Builds fresh estimators of one family for one task
#[derive(Clone, Copy)]
pub struct ModelConstructor {
    spec: &'static FamilySpec,
    task: Task,
    seed: u64,
}

impl std::fmt::Debug for ModelConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConstructor")
            .field("family", &self.spec.name)
            .field("task", &self.task)
            .field("seed", &self.seed)
            .finish()
    }
}

impl ModelConstructor {
    pub fn family(&self) -> ModelFamily {
        self.spec.family
    }

    /// Registered name, e.g. `xgboost`
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Every parameter of the family at its default value
    pub fn defaults(&self) -> HyperParams {
        let base = (self.spec.base)();
        self.spec
            .params
            .iter()
            .map(|p| (p.name.to_string(), (p.read)(&base)))
            .collect()
    }

    /// Parameters with a search domain
    pub fn search_space(&self) -> SearchSpace {
        self.spec
            .params
            .iter()
            .filter_map(|p| p.domain.map(|d| (p.name.to_string(), d)))
            .collect()
    }

    /// A fresh, unfitted estimator; parameters not given keep their defaults.
    pub fn build(&self, params: &HyperParams) -> Result<Estimator> {
        let mut boost = (self.spec.base)();
        for (name, value) in params {
            let spec = self.spec.param(name).ok_or_else(|| {
                AutoAiError::UnsupportedConfiguration(format!(
                    "unknown parameter '{}' for model '{}'",
                    name, self.spec.name
                ))
            })?;
            (spec.apply)(&mut boost, *value);
        }
        boost.seed = self.seed;
        Ok(Estimator::new(self.spec.family, self.task, boost))
    }
}

/// Look up a family by name (case-insensitive) for `task`.
pub fn resolve(task: Task, family_name: &str) -> Result<ModelConstructor> {
    let wanted = family_name.trim().to_ascii_lowercase();
    let spec = FAMILIES
        .iter()
        .find(|f| f.name == wanted)
        .ok_or_else(|| {
            AutoAiError::UnsupportedConfiguration(format!(
                "unknown model '{}', expected one of: {}",
                family_name,
                family_names().join(", ")
            ))
        })?;

    Ok(ModelConstructor {
        spec,
        task,
        seed: DEFAULT_SEED,
    })
}

/// Resolve from textual task and family names
pub fn resolve_names(task_name: &str, family_name: &str) -> Result<ModelConstructor> {
    let task: Task = task_name.parse()?;
    resolve(task, family_name)
}
