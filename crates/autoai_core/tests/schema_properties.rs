use autoai_core::{align_features, encode, Column, ColumnKind, FillPolicy, Scalar, Table};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// Property tests for the schema encoder and the inference aligner

fn arbitrary_category() -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.9, "[a-c]{1,2}")
}

fn arbitrary_table() -> impl Strategy<Value = Table> {
    (1usize..20).prop_flat_map(|rows| {
        (
            prop::collection::vec(-100.0f64..100.0, rows),
            prop::collection::vec(arbitrary_category(), rows),
            prop::collection::vec(arbitrary_category(), rows),
        )
            .prop_map(|(numbers, first, second)| {
                let text = |values: Vec<Option<String>>| -> Vec<Option<Scalar>> {
                    values.into_iter().map(|v| v.map(Scalar::Text)).collect()
                };
                // "a_b_b" collides with an indicator of "a_b" whenever level "b" appears
                Table::new(vec![
                    Column::numeric("a_b_b", &numbers),
                    Column::new("a_b", text(first)),
                    Column::new("a2", text(second)),
                ])
                .expect("valid table")
            })
    })
}

proptest! {
    #[test]
    fn encoded_columns_are_unique(table in arbitrary_table()) {
        let encoded = encode(&table, &[]);
        let unique: HashSet<&String> = encoded.columns.iter().collect();
        prop_assert_eq!(unique.len(), encoded.columns.len());
        prop_assert!(encoded.rows.iter().all(|row| row.len() == encoded.n_features()));
    }

    #[test]
    fn categorical_columns_drop_one_level(table in arbitrary_table()) {
        let encoded = encode(&table, &[]);
        let expected: usize = table
            .columns()
            .iter()
            .map(|column| match column.kind() {
                ColumnKind::Categorical => column.distinct_count() - 1,
                _ => 1,
            })
            .sum();
        prop_assert_eq!(encoded.n_features(), expected);
    }

    #[test]
    fn alignment_ignores_extras_and_key_order(
        age in -100.0f64..100.0,
        uk in prop::bool::ANY,
        extras in prop::collection::hash_map("[x-z]{3,6}", -5.0f64..5.0, 0..5),
    ) {
        let columns: Vec<String> = ["age", "country_UK", "country_USA"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut record: HashMap<String, Option<Scalar>> = extras
            .into_iter()
            .map(|(k, v)| (k, Some(Scalar::Number(v))))
            .collect();
        record.insert("age".to_string(), Some(Scalar::Number(age)));
        record.insert("country_UK".to_string(), Some(Scalar::Bool(uk)));

        let row = align_features(&record, &columns, &FillPolicy::Zero).expect("align");
        prop_assert_eq!(row, vec![age, if uk { 1.0 } else { 0.0 }, 0.0]);
    }
}

#[test]
fn aligner_example_from_schema() {
    let columns = vec![
        "age".to_string(),
        "country_UK".to_string(),
        "country_USA".to_string(),
    ];
    let record: HashMap<String, Option<Scalar>> = [
        ("age", 35.0),
        ("country_USA", 1.0),
        ("extra_field", 99.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), Some(Scalar::Number(v))))
    .collect();

    let row = align_features(&record, &columns, &FillPolicy::Zero).expect("align");
    assert_eq!(row, vec![35.0, 0.0, 1.0]);
}
