//! Hyperparameter values and search domains

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v,
        }
    }

    /// Integer view; reals are rounded
    pub fn as_i64(&self) -> i64 {
        match self {
            ParamValue::Int(v) => *v,
            ParamValue::Float(v) => v.round() as i64,
        }
    }

    /// Non-negative integer view
    pub fn as_usize(&self) -> usize {
        self.as_i64().max(0) as usize
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Named parameter assignment, ordered by name
pub type HyperParams = BTreeMap<String, ParamValue>;

/// Searchable parameters and their domains
pub type SearchSpace = BTreeMap<String, ParamDomain>;

/// Where a searchable parameter may be drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamDomain {
    /// Inclusive integer range
    Int { low: i64, high: i64 },
    /// Inclusive real range, optionally sampled on a log scale
    Float { low: f64, high: f64, log: bool },
}

impl ParamDomain {
    pub fn contains(&self, value: ParamValue) -> bool {
        match (self, value) {
            (ParamDomain::Int { low, high }, ParamValue::Int(v)) => (*low..=*high).contains(&v),
            (ParamDomain::Float { low, high, .. }, value) => {
                (*low..=*high).contains(&value.as_f64())
            }
            (ParamDomain::Int { .. }, ParamValue::Float(_)) => false,
        }
    }

    /// Uniform draw (log-uniform for log domains)
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> ParamValue {
        match *self {
            ParamDomain::Int { low, high } => ParamValue::Int(rng.gen_range(low..=high)),
            ParamDomain::Float { .. } => {
                let (low, high) = self.internal_bounds();
                self.from_internal(rng.gen_range(low..=high))
            }
        }
    }

    /// Bounds of the continuous space samplers work in.
    ///
    /// Integer ranges widen by half a step on each side so that rounding gives
    /// every integer the same mass; log domains work on `ln(value)`.
    pub fn internal_bounds(&self) -> (f64, f64) {
        match *self {
            ParamDomain::Int { low, high } => (low as f64 - 0.5, high as f64 + 0.5),
            ParamDomain::Float { low, high, log: true } => (low.ln(), high.ln()),
            ParamDomain::Float { low, high, log: false } => (low, high),
        }
    }

    pub fn to_internal(&self, value: ParamValue) -> f64 {
        match self {
            ParamDomain::Float { log: true, .. } => value.as_f64().ln(),
            _ => value.as_f64(),
        }
    }

    pub fn from_internal(&self, x: f64) -> ParamValue {
        match *self {
            ParamDomain::Int { low, high } => ParamValue::Int((x.round() as i64).clamp(low, high)),
            ParamDomain::Float { low, high, log } => {
                let value = if log { x.exp() } else { x };
                ParamValue::Float(value.clamp(low, high))
            }
        }
    }
}
