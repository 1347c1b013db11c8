//! Trainer configuration
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `AUTOAI_*` environment variables (`__` separates nested keys, e.g.
//! `AUTOAI_EXPLAIN__N_REPEATS=3`). Command-line flags are applied last by
//! the binary.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use autoai_core::{LoggingConfig, DEFAULT_ARTIFACT_PATH, DEFAULT_REGRESSION_THRESHOLD};

use crate::registry::DEFAULT_SEED;
use crate::search::{SamplerKind, SearchConfig};

/// Permutation-importance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub output_path: PathBuf,
    pub n_repeats: usize,
    /// Rows scored per repeat; larger inputs are truncated
    pub max_rows: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("feature_importance.json"),
            n_repeats: 5,
            max_rows: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub seed: u64,
    /// Share of rows held out for the final evaluation
    pub test_fraction: f64,
    /// Share of the training rows held out for scoring search trials
    pub validation_fraction: f64,
    pub n_trials: usize,
    pub sampler: SamplerKind,
    pub n_startup_trials: usize,
    /// Numeric targets with more distinct values are treated as regression
    pub regression_cardinality_threshold: usize,
    pub impute_missing: bool,
    pub artifact_path: PathBuf,
    pub explain: ExplainConfig,
    pub logging: LoggingConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let search = SearchConfig::default();
        Self {
            seed: DEFAULT_SEED,
            test_fraction: 0.2,
            validation_fraction: search.validation_fraction,
            n_trials: search.n_trials,
            sampler: search.sampler,
            n_startup_trials: search.n_startup_trials,
            regression_cardinality_threshold: DEFAULT_REGRESSION_THRESHOLD,
            impute_missing: true,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            explain: ExplainConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&TrainerConfig::default())
            .context("Failed to encode default configuration")?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                bail!("Configuration file {} not found", path.display());
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTOAI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: TrainerConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("test_fraction", self.test_fraction),
            ("validation_fraction", self.validation_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                bail!("{name} must be in (0, 1), got {value}");
            }
        }
        if self.n_trials == 0 {
            bail!("n_trials must be at least 1");
        }
        if self.explain.n_repeats == 0 || self.explain.max_rows == 0 {
            bail!("explain.n_repeats and explain.max_rows must be at least 1");
        }
        Ok(())
    }

    /// Search settings derived from this configuration
    pub fn search(&self) -> SearchConfig {
        SearchConfig {
            n_trials: self.n_trials,
            validation_fraction: self.validation_fraction,
            seed: self.seed,
            sampler: self.sampler,
            n_startup_trials: self.n_startup_trials,
        }
    }
}
