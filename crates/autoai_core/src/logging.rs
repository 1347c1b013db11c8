//! Tracing setup for the AutoAI binaries

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn directive(&self, verbose: bool) -> &str {
        if verbose {
            "debug"
        } else {
            &self.level
        }
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive(verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        };
        assert_eq!(config.directive(false), "warn");
        assert_eq!(config.directive(true), "debug");
    }

    #[test]
    fn test_format_names() {
        let parsed: LoggingConfig =
            serde_json::from_str(r#"{"format":"compact"}"#).expect("parse");
        assert_eq!(parsed.format, LogFormat::Compact);
        assert_eq!(parsed.level, "info");
        assert!(serde_json::from_str::<LoggingConfig>(r#"{"format":"json"}"#).is_err());
    }
}
