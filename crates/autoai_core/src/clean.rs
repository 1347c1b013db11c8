//! Missing value imputation
//!
//! Numeric columns take the mean of their present values; boolean and
//! categorical columns take their most frequent value. Fill values are
//! learned from a chosen set of rows and can then be applied to any table
//! with the same columns.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::table::{Column, ColumnKind, Scalar, Table};

/// Per-column fill values learned from a subset of rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imputer {
    fills: BTreeMap<String, Scalar>,
}

impl Imputer {
    /// Learn fill values from the cells of `table` at `rows`.
    ///
    /// Columns named in `excluded` are skipped, as are columns without a
    /// missing cell anywhere in `table` and columns with no present cell
    /// among `rows`.
    pub fn fit(table: &Table, rows: &[usize], excluded: &[&str]) -> Self {
        let mut fills = BTreeMap::new();

        for column in table.columns() {
            if excluded.contains(&column.name.as_str()) || column.missing_count() == 0 {
                continue;
            }

            let fitted = column.select(rows);
            let fill = match column.kind() {
                ColumnKind::Numeric => {
                    let present = fitted.numeric_values();
                    if present.is_empty() {
                        None
                    } else {
                        let mean = present.iter().sum::<f64>() / present.len() as f64;
                        Some(Scalar::Number(mean))
                    }
                }
                ColumnKind::Boolean | ColumnKind::Categorical => fitted.mode(),
            };

            if let Some(fill) = fill {
                debug!(
                    column = %column.name,
                    missing = column.missing_count(),
                    fitted_rows = rows.len(),
                    fill = %fill,
                    "learned fill value"
                );
                fills.insert(column.name.clone(), fill);
            }
        }

        Self { fills }
    }

    pub fn fill_for(&self, column: &str) -> Option<&Scalar> {
        self.fills.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Return a copy of `table` with every missing cell of a fitted column
    /// replaced by its fill value.
    pub fn apply(&self, table: &Table) -> Table {
        let columns = table
            .columns()
            .iter()
            .map(|column| match self.fills.get(&column.name) {
                Some(fill) => Column::new(
                    column.name.clone(),
                    column
                        .values
                        .iter()
                        .map(|value| value.clone().or_else(|| Some(fill.clone())))
                        .collect(),
                ),
                None => column.clone(),
            })
            .collect();

        if self.fills.is_empty() {
            info!("No missing values found");
        } else {
            info!("Imputed missing values in {} column(s)", self.fills.len());
        }

        Table::from_columns_unchecked(columns)
    }
}

/// Impute every column except `excluded`, learning fills from all rows.
pub fn impute_missing_values(table: &Table, excluded: &[&str]) -> Table {
    let rows: Vec<usize> = (0..table.n_rows()).collect();
    Imputer::fit(table, &rows, excluded).apply(table)
}
