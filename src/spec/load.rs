use anyhow::Context;
use oas3::OpenApiV3Spec;
use serde_json::Value;

/// Parse a generated (or hand-written) document into the typed `oas3` model.
///
/// # Errors
///
/// When the document is not a valid OpenAPI 3.1 description.
pub fn parse_spec(value: Value) -> anyhow::Result<OpenApiV3Spec> {
    serde_json::from_value(value).context("Document is not a valid OpenAPI 3.1 description")
}

/// Parse a YAML or JSON document from a string.
///
/// # Errors
///
/// When the text is neither YAML nor JSON, or not a valid OpenAPI description.
pub fn parse_spec_str(content: &str) -> anyhow::Result<OpenApiV3Spec> {
    let value: Value = serde_yaml::from_str(content).context("Failed to parse document")?;
    parse_spec(value)
}

/// Render a document as YAML.
///
/// # Errors
///
/// Only if serialization fails.
pub fn to_yaml(value: &Value) -> anyhow::Result<String> {
    serde_yaml::to_string(value).context("Failed to render document as YAML")
}
