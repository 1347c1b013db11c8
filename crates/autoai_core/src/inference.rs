//! Inference alignment
//!
//! A prediction request is a loosely keyed record. Before scoring, it is
//! reindexed to the artifact's canonical columns: columns the request lacks
//! (or sends as null) take the fill value, keys the model never saw are
//! dropped, and the canonical order is restored.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::artifact::{TrainedArtifact, DEFAULT_ARTIFACT_PATH};
use crate::errors::{AutoAiError, Result};
use crate::table::Scalar;

/// Request body: feature name to value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub data: HashMap<String, Option<Scalar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Scalar,
}

/// Value given to canonical columns the request does not supply.
///
/// Unnamed columns, one-hot indicators included, always take zero, which is
/// the "category absent" value the encoder produces.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FillPolicy {
    #[default]
    Zero,
    /// Fill the named numeric columns with their own value
    PerColumn(BTreeMap<String, f64>),
}

impl FillPolicy {
    pub fn value_for(&self, column: &str) -> f64 {
        match self {
            FillPolicy::Zero => 0.0,
            FillPolicy::PerColumn(values) => values.get(column).copied().unwrap_or(0.0),
        }
    }
}

impl From<BTreeMap<String, f64>> for FillPolicy {
    fn from(values: BTreeMap<String, f64>) -> Self {
        if values.is_empty() {
            FillPolicy::Zero
        } else {
            FillPolicy::PerColumn(values)
        }
    }
}

/// Build one feature row positioned by `columns`.
pub fn align_features(
    record: &HashMap<String, Option<Scalar>>,
    columns: &[String],
    fill: &FillPolicy,
) -> Result<Vec<f64>> {
    columns
        .iter()
        .map(|column| match record.get(column) {
            None | Some(None) => Ok(fill.value_for(column)),
            Some(Some(Scalar::Number(value))) => Ok(*value),
            Some(Some(Scalar::Bool(flag))) => Ok(if *flag { 1.0 } else { 0.0 }),
            Some(Some(Scalar::Text(text))) => text.trim().parse::<f64>().map_err(|_| {
                AutoAiError::PredictionFailed(format!(
                    "column '{column}' expects a number, got '{text}'"
                ))
            }),
        })
        .collect()
}

/// Align `request` to `artifact` and score it.
pub fn predict(
    request: &PredictionRequest,
    artifact: &TrainedArtifact,
    fill: &FillPolicy,
) -> Result<PredictionResponse> {
    let row = align_features(&request.data, &artifact.columns, fill)?;
    let ignored = request
        .data
        .keys()
        .filter(|key| !artifact.columns.contains(*key))
        .count();
    debug!(
        supplied = request.data.len(),
        ignored,
        columns = artifact.columns.len(),
        "aligned prediction request"
    );

    Ok(PredictionResponse {
        prediction: artifact.model.predict_scalar(&row)?,
    })
}

/// Serves predictions from the artifact on disk.
///
/// The artifact is read again on every call, so a retrained model is picked
/// up without restarting.
#[derive(Debug, Clone)]
pub struct InferenceAligner {
    artifact_path: PathBuf,
    fill: FillPolicy,
}

impl Default for InferenceAligner {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT_PATH)
    }
}

impl InferenceAligner {
    pub fn new(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            fill: FillPolicy::Zero,
        }
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let artifact = TrainedArtifact::load(&self.artifact_path)?;
        predict(request, &artifact, &self.fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        ["age", "country_UK", "country_USA"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn record(pairs: &[(&str, Option<Scalar>)]) -> HashMap<String, Option<Scalar>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_reindex_fills_and_drops() {
        let data = record(&[
            ("age", Some(Scalar::Number(35.0))),
            ("country_USA", Some(Scalar::Number(1.0))),
            ("extra_field", Some(Scalar::Number(99.0))),
        ]);
        let row = align_features(&data, &columns(), &FillPolicy::Zero).expect("align");
        assert_eq!(row, vec![35.0, 0.0, 1.0]);
    }

    #[test]
    fn test_per_column_fill_leaves_indicators_at_zero() {
        let fill = FillPolicy::PerColumn(BTreeMap::from([("age".to_string(), -1.0)]));
        let data = record(&[("age", None), ("country_UK", Some(Scalar::Bool(true)))]);
        let row = align_features(&data, &columns(), &fill).expect("align");
        assert_eq!(row, vec![-1.0, 1.0, 0.0]);

        let row = align_features(&record(&[]), &columns(), &fill).expect("align");
        assert_eq!(row, vec![-1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let data = record(&[("age", Some(Scalar::from("41")))]);
        let row = align_features(&data, &columns(), &FillPolicy::Zero).expect("align");
        assert_eq!(row[0], 41.0);

        let bad = record(&[("age", Some(Scalar::from("old")))]);
        assert!(matches!(
            align_features(&bad, &columns(), &FillPolicy::Zero),
            Err(AutoAiError::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_request_json_shape() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"data":{"age":35,"country":"UK","member":null,"vip":true}}"#)
                .expect("parse");
        assert_eq!(request.data.get("age"), Some(&Some(Scalar::Number(35.0))));
        assert_eq!(request.data.get("member"), Some(&None));
        assert_eq!(request.data.get("vip"), Some(&Some(Scalar::Bool(true))));
    }

    #[test]
    fn test_fill_policy_from_map() {
        assert_eq!(FillPolicy::from(BTreeMap::new()), FillPolicy::Zero);
        let fill = FillPolicy::from(BTreeMap::from([("age".to_string(), 2.5)]));
        assert_eq!(fill.value_for("age"), 2.5);
        assert_eq!(fill.value_for("country_USA"), 0.0);
    }
}
