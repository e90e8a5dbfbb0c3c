use jsonschema::validator_for;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("Instance validation failed")]
    ValidationFailed,
}

/// Validate a JSON instance against a JSON Schema (draft 2020-12).
/// Returns Ok(()) if valid, Err otherwise.
pub fn validate_json(schema_str: &str, instance_str: &str) -> Result<(), SchemaValidationError> {
    let schema_json: Value = serde_json::from_str(schema_str)?;
    let instance_json: Value = serde_json::from_str(instance_str)?;
    validate_value(&schema_json, &instance_json)
}

pub fn validate_value(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator =
        validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    if validator.is_valid(instance) {
        Ok(())
    } else {
        Err(SchemaValidationError::ValidationFailed)
    }
}

/// Check that a tool input schema compiles and describes an object.
pub fn check_input_schema(schema: &Value) -> Result<(), SchemaValidationError> {
    validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaValidationError::SchemaCompile(
            "input schema must have type \"object\"".into(),
        ));
    }
    Ok(())
}
