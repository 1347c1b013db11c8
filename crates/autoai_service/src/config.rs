//! Service configuration

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use autoai_core::{FillPolicy, LoggingConfig, DEFAULT_ARTIFACT_PATH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub artifact_path: PathBuf,
    /// Fill values for numeric columns a request leaves out. Any column not
    /// listed, one-hot indicators included, is filled with zero.
    pub fill_values: BTreeMap<String, f64>,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            fill_values: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load defaults, then `path` if given, then `AUTOAI_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&ServiceConfig::default())
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

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn fill_policy(&self) -> FillPolicy {
        FillPolicy::from(self.fill_values.clone())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "port = 9100\nartifact_path = \"models/current.json\"\n\n[fill_values]\nage = -1.0"
        )
        .expect("write");

        let config = ServiceConfig::load(Some(file.path())).expect("config");
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "0.0.0.0");
        let fill = config.fill_policy();
        assert_eq!(fill.value_for("age"), -1.0);
        assert_eq!(fill.value_for("country_USA"), 0.0);
        assert_eq!(config.artifact_path, PathBuf::from("models/current.json"));
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.fill_policy(), FillPolicy::Zero);
    }
}
