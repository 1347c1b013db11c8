//! Descriptive statistics report

use autoai_core::{AutoAiError, Column, ColumnKind, Result, Scalar, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Summary of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Present cells
    pub count: usize,
    pub missing: usize,
    pub distinct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Most frequent value, for non-numeric columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaReport {
    pub n_rows: usize,
    pub n_columns: usize,
    pub columns: Vec<ColumnProfile>,
    pub generated_at: DateTime<Utc>,
}

fn profile_column(column: &Column) -> ColumnProfile {
    let kind = column.kind();
    let missing = column.missing_count();
    let mut profile = ColumnProfile {
        name: column.name.clone(),
        kind,
        count: column.len() - missing,
        missing,
        distinct: column.distinct_count(),
        mean: None,
        std: None,
        min: None,
        max: None,
        top: None,
    };

    let values = column.numeric_values();
    if kind == ColumnKind::Numeric && !values.is_empty() {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        // Sample standard deviation; undefined for a single value
        let std = (values.len() > 1).then(|| {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        });
        profile.mean = Some(mean);
        profile.std = std;
        profile.min = values.iter().copied().reduce(f64::min);
        profile.max = values.iter().copied().reduce(f64::max);
    } else {
        profile.top = column.mode();
    }
    profile
}

/// Profile every column of `table`.
pub fn profile_table(table: &Table) -> EdaReport {
    EdaReport {
        n_rows: table.n_rows(),
        n_columns: table.n_columns(),
        columns: table.columns().iter().map(profile_column).collect(),
        generated_at: Utc::now(),
    }
}

/// Profile `table` and write the report to `path` as pretty JSON.
pub fn generate_eda_report<P: AsRef<Path>>(table: &Table, path: P) -> Result<EdaReport> {
    let path = path.as_ref();
    let report = profile_table(table);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).map_err(|err| {
        AutoAiError::Io(std::io::Error::new(
            err.kind(),
            format!("cannot write EDA report to {}: {err}", path.display()),
        ))
    })?;

    info!(
        path = %path.display(),
        columns = report.n_columns,
        rows = report.n_rows,
        "EDA report written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            Column::numeric("age", &[20.0, 30.0, 40.0]),
            Column::new(
                "city",
                vec![Some(Scalar::from("Oslo")), None, Some(Scalar::from("Oslo"))],
            ),
        ])
        .expect("table")
    }

    #[test]
    fn test_numeric_and_categorical_profiles() {
        let report = profile_table(&table());
        assert_eq!(report.n_rows, 3);

        let age = &report.columns[0];
        assert_eq!(age.kind, ColumnKind::Numeric);
        assert_eq!(age.mean, Some(30.0));
        assert_eq!(age.std, Some(10.0));
        assert_eq!((age.min, age.max), (Some(20.0), Some(40.0)));
        assert!(age.top.is_none());

        let city = &report.columns[1];
        assert_eq!(city.kind, ColumnKind::Categorical);
        assert_eq!((city.count, city.missing, city.distinct), (2, 1, 1));
        assert_eq!(city.top, Some(Scalar::from("Oslo")));
        assert!(city.mean.is_none());
    }

    #[test]
    fn test_report_written_as_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("eda.json");
        generate_eda_report(&table(), &path).expect("report");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(json["columns"][1]["top"], "Oslo");
        assert!(json["columns"][1].get("mean").is_none());

        assert!(generate_eda_report(&table(), dir.path().join("missing/eda.json")).is_err());
    }
}
