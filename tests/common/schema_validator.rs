//! JSON Schema checks for API responses

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fs;

/// Compile `tests/schemas/<name>.json`
pub fn load_test_schema(name: &str) -> JSONSchema {
    let path = format!("{}/tests/schemas/{name}.json", env!("CARGO_MANIFEST_DIR"));
    let content =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read schema file: {path}"));
    let schema: Value = serde_json::from_str(&content)
        .unwrap_or_else(|_| panic!("Failed to parse schema JSON: {path}"));

    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile schema")
}

/// Validate a value, collecting every violation
pub fn validate_against_schema(data: &Value, schema: &JSONSchema) -> Result<(), Vec<String>> {
    schema.validate(data).map_err(|errors| {
        errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect()
    })
}

/// Panic with every violation and the offending document
pub fn assert_matches_schema(data: &Value, schema_name: &str) {
    let schema = load_test_schema(schema_name);
    if let Err(errors) = validate_against_schema(data, &schema) {
        for error in &errors {
            eprintln!("  - {error}");
        }
        panic!(
            "{schema_name} schema validation failed with {} errors:\n{}",
            errors.len(),
            serde_json::to_string_pretty(data).unwrap()
        );
    }
}
