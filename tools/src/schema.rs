//! JSON Schema validation for tool arguments

use anyhow::{bail, Result};

/// Parse argument bytes into a serde_json::Value.
///
/// An empty payload is treated as an empty object, which is what the
/// runtime sends for tools that declare no parameters.
pub fn parse_input(input: &[u8]) -> Result<serde_json::Value> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(input).map_err(|e| anyhow::anyhow!("Invalid JSON input: {e}"))
}

/// Validate argument bytes against a tool's input schema
pub fn validate_input(input: &[u8], schema: &serde_json::Value) -> Result<()> {
    if schema.is_null() {
        return Ok(()); // No schema = no validation
    }

    let input_value = parse_input(input)?;

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| anyhow::anyhow!("Invalid JSON schema: {e}"))?;

    if let Err(error) = validator.validate(&input_value) {
        bail!("Input validation failed: {}", error);
    }

    Ok(())
}
