//! Tabular dataset model and CSV loading
//!
//! A [`Table`] is an ordered set of uniquely named, equal-length columns of
//! loosely typed cells. Missing cells are `None`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::{AutoAiError, Result};

/// Field values read as missing
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Parse a raw text field the way a CSV reader would
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return None;
        }

        match trimmed {
            "true" | "True" | "TRUE" => return Some(Scalar::Bool(true)),
            "false" | "False" | "FALSE" => return Some(Scalar::Bool(false)),
            _ => {}
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Scalar::Number(value)),
            _ => Some(Scalar::Text(trimmed.to_string())),
        }
    }

    /// Numeric view of the cell (booleans as 1/0)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(value) => Some(*value),
            Scalar::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Scalar::Text(_) => None,
        }
    }

    /// Key used for categorical levels and class labels
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(flag) => write!(f, "{flag}"),
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Storage kind of a column, inferred from its present cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Scalar>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Scalar>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Fully present numeric column
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().map(|&v| Some(Scalar::Number(v))).collect())
    }

    /// Fully present text column
    pub fn text(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, values.iter().map(|&v| Some(Scalar::from(v))).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn kind(&self) -> ColumnKind {
        let mut present = self.values.iter().flatten().peekable();
        if present.peek().is_none() {
            return ColumnKind::Numeric;
        }

        let mut all_numbers = true;
        let mut all_bools = true;
        for value in present {
            match value {
                Scalar::Number(_) => all_bools = false,
                Scalar::Bool(_) => all_numbers = false,
                Scalar::Text(_) => return ColumnKind::Categorical,
            }
        }

        if all_numbers {
            ColumnKind::Numeric
        } else if all_bools {
            ColumnKind::Boolean
        } else {
            ColumnKind::Categorical
        }
    }

    /// Sorted distinct keys of the present cells
    pub fn distinct_keys(&self) -> BTreeSet<String> {
        self.values.iter().flatten().map(Scalar::key).collect()
    }

    pub fn distinct_count(&self) -> usize {
        self.distinct_keys().len()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Present cells with a numeric view
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .flatten()
            .filter_map(Scalar::as_f64)
            .collect()
    }

    /// The cells at `rows`, in that order; out of range positions are skipped
    pub fn select(&self, rows: &[usize]) -> Column {
        Column::new(
            self.name.clone(),
            rows.iter()
                .filter_map(|&row| self.values.get(row).cloned())
                .collect(),
        )
    }

    /// Most frequent present value; ties resolve to the smallest key
    pub fn mode(&self) -> Option<Scalar> {
        let mut counts: BTreeMap<String, (usize, &Scalar)> = BTreeMap::new();
        for value in self.values.iter().flatten() {
            counts.entry(value.key()).or_insert((0, value)).0 += 1;
        }

        let mut best: Option<(usize, &Scalar)> = None;
        for (count, value) in counts.into_values() {
            if best.map_or(true, |(best_count, _)| count > best_count) {
                best = Some((count, value));
            }
        }
        best.map(|(_, value)| value.clone())
    }
}

/// An ordered collection of named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking column lengths and name uniqueness
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(AutoAiError::Dataset(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(column) = columns.iter().find(|c| c.len() != expected) {
                return Err(AutoAiError::Dataset(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    expected
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Load a table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            AutoAiError::Dataset(format!("failed to open {}: {err}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Load a table from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| AutoAiError::Dataset(format!("invalid CSV header: {err}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut values: Vec<Vec<Option<Scalar>>> = vec![Vec::new(); headers.len()];
        for (line_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|err| {
                AutoAiError::Dataset(format!("record {}: {err}", line_idx + 1))
            })?;
            for (column, field) in values.iter_mut().zip(record.iter()) {
                column.push(Scalar::parse(field));
            }
        }

        if values.first().map_or(true, Vec::is_empty) {
            return Err(AutoAiError::Dataset("dataset is empty".to_string()));
        }

        let columns = headers
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Self {
        Self { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scalar_parsing() {
        assert_eq!(Scalar::parse(" 35 "), Some(Scalar::Number(35.0)));
        assert_eq!(Scalar::parse("True"), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::parse("UK"), Some(Scalar::Text("UK".to_string())));
        assert_eq!(Scalar::parse(""), None);
        assert_eq!(Scalar::parse("NaN"), None);
        assert_eq!(Scalar::parse("inf"), Some(Scalar::Text("inf".to_string())));
    }

    #[test]
    fn test_load_csv() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "age,country,churned")?;
        writeln!(file, "35,UK,1")?;
        writeln!(file, ",USA,0")?;
        writeln!(file, "51,FR,1")?;
        file.flush()?;

        let table = Table::from_csv(file.path())?;
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column_names(), vec!["age", "country", "churned"]);

        let age = table.column("age").expect("age column");
        assert_eq!(age.kind(), ColumnKind::Numeric);
        assert_eq!(age.missing_count(), 1);
        assert_eq!(
            table.column("country").map(Column::kind),
            Some(ColumnKind::Categorical)
        );
        Ok(())
    }

    #[test]
    fn test_ragged_csv_is_rejected() {
        let data = "a,b\n1,2\n3\n";
        assert!(matches!(
            Table::from_reader(data.as_bytes()),
            Err(AutoAiError::Dataset(_))
        ));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = Table::new(vec![
            Column::numeric("x", &[1.0]),
            Column::numeric("x", &[2.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_breaks_ties_by_key() {
        let column = Column::text("c", &["b", "a", "b", "a", "c"]);
        assert_eq!(column.mode(), Some(Scalar::from("a")));
    }

    #[test]
    fn test_mixed_column_is_categorical() {
        let column = Column::new(
            "mixed",
            vec![Some(Scalar::Number(1.0)), Some(Scalar::Bool(true))],
        );
        assert_eq!(column.kind(), ColumnKind::Categorical);
        assert_eq!(Column::new("empty", vec![None, None]).kind(), ColumnKind::Numeric);
    }
}
