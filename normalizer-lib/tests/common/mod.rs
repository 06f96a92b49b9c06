//! Common test utilities for the normalizer-lib integration tests

use normalizer_lib::Record;
use serde_json::Value;

// Re-export shared test utilities from src/test_utils.rs
#[allow(unused_imports)]
pub use normalizer_lib::test_utils::{build_xlsx, create_test_ingestor, xlsx_fixture};

/// Records as a JSON array, for comparing against `json!` literals
#[allow(dead_code)]
pub fn records_to_json(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}
