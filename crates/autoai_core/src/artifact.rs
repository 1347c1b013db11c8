//! Persisted model artifact
//!
//! The artifact is one canonical JSON object with exactly two fields: the
//! fitted model and the canonical column list it was trained on. Saving
//! replaces the file atomically, so readers see either the previous artifact
//! or the new one and never a partial write.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{AutoAiError, Result};
use crate::estimator::Estimator;
use crate::serde_canon::{digest_hex, to_canonical_json};

/// Where training writes and serving reads, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "trained_model.json";

/// A fitted model together with its canonical feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainedArtifact {
    pub model: Estimator,
    pub columns: Vec<String>,
}

impl TrainedArtifact {
    pub fn new(model: Estimator, columns: Vec<String>) -> Result<Self> {
        let artifact = Self { model, columns };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        let booster = self
            .model
            .booster
            .as_ref()
            .ok_or_else(|| AutoAiError::InvalidArtifact("model is not fitted".to_string()))?;

        if booster.n_features != self.columns.len() {
            return Err(AutoAiError::InvalidArtifact(format!(
                "model expects {} features but {} columns are recorded",
                booster.n_features,
                self.columns.len()
            )));
        }
        booster.validate().map_err(AutoAiError::InvalidArtifact)
    }

    /// BLAKE3 digest of the canonical serialized form
    pub fn digest(&self) -> Result<String> {
        Ok(digest_hex(to_canonical_json(self)?.as_bytes()))
    }

    /// Atomically write the artifact to `path`, returning its digest.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let json = to_canonical_json(self)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| err.error)?;

        let digest = digest_hex(json.as_bytes());
        info!(
            path = %path.display(),
            columns = self.columns.len(),
            digest = %digest,
            "saved model artifact"
        );
        Ok(digest)
    }

    /// Read and check an artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AutoAiError::ArtifactNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        let artifact: TrainedArtifact = serde_json::from_slice(&bytes)?;
        artifact.validate()?;
        debug!(path = %path.display(), "loaded model artifact");
        Ok(artifact)
    }
}
