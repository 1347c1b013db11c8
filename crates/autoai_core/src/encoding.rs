//! Schema encoder: categorical expansion into a numeric matrix
//!
//! Numeric and boolean columns pass through in table order. Every
//! categorical column is then expanded into one indicator column per observed
//! value, omitting the first value (by key order) as the reference level.
//!
//! The resulting column list is the canonical schema of a training run. It
//! depends on which values appear in the encoded data, so a later record can
//! only be scored after being reconciled against it (see [`crate::inference`]).

use std::collections::HashSet;
use tracing::debug;

use crate::table::{ColumnKind, Scalar, Table};

/// Numeric feature matrix with its ordered, de-duplicated column list
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMatrix {
    /// Row-major feature values
    pub rows: Vec<Vec<f64>>,
    /// Canonical column names, one per feature
    pub columns: Vec<String>,
}

impl EncodedMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Encode every column of `table` not named in `excluded`.
pub fn encode(table: &Table, excluded: &[&str]) -> EncodedMatrix {
    let mut rows: Vec<Vec<f64>> = vec![Vec::new(); table.n_rows()];
    let mut columns = Vec::new();
    let mut taken = HashSet::new();
    let mut categorical = Vec::new();

    for column in table.columns() {
        if excluded.contains(&column.name.as_str()) {
            continue;
        }

        if column.kind() == ColumnKind::Categorical {
            categorical.push(column);
            continue;
        }

        columns.push(claim_name(&column.name, &mut taken));
        for (row, value) in rows.iter_mut().zip(&column.values) {
            row.push(value.as_ref().and_then(Scalar::as_f64).unwrap_or(f64::NAN));
        }
    }

    for column in categorical {
        let levels: Vec<String> = column.distinct_keys().into_iter().skip(1).collect();
        debug!(
            column = %column.name,
            indicators = levels.len(),
            "expanding categorical column"
        );

        for level in &levels {
            columns.push(claim_name(&format!("{}_{}", column.name, level), &mut taken));
        }

        for (row, value) in rows.iter_mut().zip(&column.values) {
            let key = value.as_ref().map(Scalar::key);
            row.extend(levels.iter().map(|level| {
                if key.as_deref() == Some(level.as_str()) {
                    1.0
                } else {
                    0.0
                }
            }));
        }
    }

    EncodedMatrix { rows, columns }
}

/// First free variant of `name`: itself, then `name_1`, `name_2`, ...
fn claim_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut suffix = 1usize;
    while taken.contains(&candidate) {
        candidate = format!("{name}_{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn sample_table() -> Table {
        Table::new(vec![
            Column::numeric("age", &[35.0, 42.0, 29.0]),
            Column::text("country", &["USA", "UK", "FR"]),
            Column::new(
                "member",
                vec![
                    Some(Scalar::Bool(true)),
                    Some(Scalar::Bool(false)),
                    None,
                ],
            ),
            Column::numeric("target", &[1.0, 0.0, 1.0]),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_drop_first_expansion() {
        let encoded = encode(&sample_table(), &["target"]);

        assert_eq!(
            encoded.columns,
            vec!["age", "member", "country_UK", "country_USA"]
        );
        assert_eq!(encoded.rows[0], vec![35.0, 1.0, 0.0, 1.0]);
        assert_eq!(encoded.rows[1], vec![42.0, 0.0, 1.0, 0.0]);
        // FR is the reference level
        assert_eq!(&encoded.rows[2][2..], &[0.0, 0.0]);
        assert!(encoded.rows[2][1].is_nan());
    }

    #[test]
    fn test_missing_category_is_all_zeros() {
        let table = Table::new(vec![Column::new(
            "color",
            vec![
                Some(Scalar::from("red")),
                None,
                Some(Scalar::from("blue")),
            ],
        )])
        .expect("table");

        let encoded = encode(&table, &[]);
        assert_eq!(encoded.columns, vec!["color_red"]);
        assert_eq!(encoded.rows[1], vec![0.0]);
    }

    #[test]
    fn test_colliding_names_are_deduplicated() {
        let table = Table::new(vec![
            Column::numeric("city_Paris", &[1.0, 0.0]),
            Column::text("city", &["Lyon", "Paris"]),
        ])
        .expect("table");

        let encoded = encode(&table, &[]);
        assert_eq!(encoded.columns, vec!["city_Paris", "city_Paris_1"]);
    }

    #[test]
    fn test_single_level_category_vanishes() {
        let table = Table::new(vec![Column::text("constant", &["x", "x"])]).expect("table");
        let encoded = encode(&table, &[]);
        assert_eq!(encoded.n_features(), 0);
        assert_eq!(encoded.n_rows(), 2);
    }
}
