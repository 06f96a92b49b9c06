//! Property-based checks of the pipeline over generated sheets

use normalizer_lib::Record;
use proptest::prelude::*;
use serde_json::{Value, json};

mod common;
use common::{create_test_ingestor, xlsx_fixture};

const HEADERS: [&str; 3] = ["Location", "Value", "Notes"];
const NORMALIZED: [&str; 3] = ["location", "value", "notes"];

/// A data row: optional location, a number, and an optional note
fn row_strategy() -> impl Strategy<Value = (Option<String>, i32, Option<String>)> {
    (
        proptest::option::of("[A-Za-z]{1,8}"),
        any::<i32>(),
        proptest::option::of("[a-z]{1,6}( [a-z]{1,4})?"),
    )
}

fn sheet(rows: &[(Option<String>, i32, Option<String>)]) -> Vec<u8> {
    let mut cells = vec![json!(HEADERS)];
    cells.extend(
        rows.iter()
            .map(|(location, value, notes)| json!([location, value, notes])),
    );
    xlsx_fixture(Value::Array(cells))
}

fn expected(rows: &[(Option<String>, i32, Option<String>)]) -> Vec<Record> {
    rows.iter()
        .filter(|(location, _, _)| location.is_some())
        .map(|(location, value, notes)| {
            match json!({"location": location, "value": value, "notes": notes}) {
                Value::Object(record) => record,
                _ => unreachable!(),
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32, ..ProptestConfig::default()
    })]

    #[test]
    fn test_records_keep_order_and_skip_only_missing_keys(
        rows in proptest::collection::vec(row_strategy(), 0..40)
    ) {
        let records = create_test_ingestor(None).ingest_bytes(sheet(&rows)).unwrap();

        prop_assert_eq!(&records, &expected(&rows));
        for record in &records {
            prop_assert_eq!(record.keys().map(String::as_str).collect::<Vec<_>>(), NORMALIZED.to_vec());
        }
    }

    #[test]
    fn test_batch_size_does_not_change_records(
        rows in proptest::collection::vec(row_strategy(), 0..40),
        batch_size in 1usize..12
    ) {
        let bytes = sheet(&rows);

        let batched = create_test_ingestor(Some(batch_size)).ingest_bytes(bytes.clone()).unwrap();
        let single = create_test_ingestor(Some(1)).ingest_bytes(bytes.clone()).unwrap();
        let unbounded = create_test_ingestor(None).ingest_bytes(bytes).unwrap();

        prop_assert_eq!(&batched, &unbounded);
        prop_assert_eq!(&single, &unbounded);
    }
}
