use crate::dataclass::{dataclass_of, DataclassInfo, Empty, FieldType};
use crate::dispatcher::OperationMeta;
use crate::router::Api;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const OPENAPI_VERSION: &str = "3.1.0";

/// Generate the OpenAPI document for every view mounted on `api`.
///
/// Raw routes are not included.
#[must_use]
pub fn build_openapi(api: &Api) -> Value {
    let config = api.config();
    let mut info = Map::new();
    info.insert("title".to_string(), json!(config.title));
    info.insert("version".to_string(), json!(config.version));
    if let Some(description) = &config.description {
        info.insert("description".to_string(), json!(description));
    }

    let mut paths = Map::new();
    for (pattern, view) in api.views() {
        let mut item = Map::new();
        for op in view.operations() {
            item.insert(
                op.method.as_str().to_ascii_lowercase(),
                build_operation(pattern, op),
            );
        }
        paths.insert(pattern.to_string(), Value::Object(item));
    }

    let schemas: Map<String, Value> = api
        .components()
        .iter()
        .map(|(name, info)| ((*name).to_string(), info.schema()))
        .collect();

    debug!(
        paths = paths.len(),
        schemas = schemas.len(),
        "OpenAPI document generated"
    );

    json!({
        "openapi": OPENAPI_VERSION,
        "info": Value::Object(info),
        "paths": Value::Object(paths),
        "components": { "schemas": Value::Object(schemas) },
    })
}

/// `operationId` used when a view was not given a name: `get_pets_pet_id`.
#[must_use]
pub fn default_operation_id(method: &http::Method, pattern: &str) -> String {
    let slug = pattern
        .to_lowercase()
        .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let slug = if slug.is_empty() { "root".to_string() } else { slug };
    format!("{}_{slug}", method.as_str().to_ascii_lowercase())
}

fn captures(pattern: &str) -> Vec<&str> {
    pattern
        .split('/')
        .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .collect()
}

fn build_operation(pattern: &str, op: &OperationMeta) -> Value {
    let mut operation = Map::new();
    let operation_id = op
        .operation_id
        .clone()
        .unwrap_or_else(|| default_operation_id(&op.method, pattern));
    operation.insert("operationId".to_string(), json!(operation_id));
    if let Some(summary) = &op.summary {
        operation.insert("summary".to_string(), json!(summary));
    }
    if let Some(description) = &op.description {
        operation.insert("description".to_string(), json!(description));
    }

    let mut parameters = Vec::new();
    let path_info = op.param("Path").and_then(|t| t.dataclass());
    for name in captures(pattern) {
        let field = path_info.as_ref().and_then(|info| info.field(name));
        let mut param = json!({
            "name": name,
            "in": "path",
            "required": true,
            "schema": field.map_or_else(|| json!({ "type": "string" }), |f| f.ty.schema()),
        });
        if let Some(desc) = field.and_then(|f| f.description) {
            param["description"] = json!(desc);
        }
        parameters.push(param);
    }
    if let Some(info) = op.param("Query").and_then(|t| t.dataclass()) {
        parameters.extend(query_parameters(&info));
    }
    if !parameters.is_empty() {
        operation.insert("parameters".to_string(), Value::Array(parameters));
    }

    if let Some(info) = op.param("Data").and_then(|t| t.dataclass()) {
        let schema = schema_ref(info.name);
        operation.insert(
            "requestBody".to_string(),
            json!({
                "required": info.fields.iter().any(|f| f.is_required()),
                "content": {
                    "application/json": { "schema": schema },
                    "application/x-www-form-urlencoded": { "schema": schema },
                },
            }),
        );
    }

    let mut responses = Map::new();
    responses.insert(op.status.as_str().to_string(), success_response(op));
    if op.has_input() {
        responses.insert(
            "400".to_string(),
            json!({
                "description": "Invalid request",
                "content": { "application/json": { "schema": validation_error_schema() } },
            }),
        );
    }
    if !op.permissions.is_empty() {
        responses.insert(
            "403".to_string(),
            json!({
                "description": "Permission denied",
                "content": { "application/json": { "schema": detail_schema() } },
            }),
        );
        operation.insert("x-permissions".to_string(), json!(op.permissions));
    }
    operation.insert("responses".to_string(), Value::Object(responses));

    Value::Object(operation)
}

fn query_parameters(info: &DataclassInfo) -> Vec<Value> {
    info.fields
        .iter()
        .map(|field| {
            let mut param = json!({
                "name": field.name,
                "in": "query",
                "required": field.is_required(),
                "schema": field.ty.schema(),
            });
            if let Some(desc) = field.description {
                param["description"] = json!(desc);
            }
            if matches!(field.ty, FieldType::List(_)) {
                param["style"] = json!("form");
                param["explode"] = json!(true);
            }
            param
        })
        .collect()
}

fn success_response(op: &OperationMeta) -> Value {
    let description = op.status.canonical_reason().unwrap_or("Success");
    let is_empty = dataclass_of::<Empty>().is_some_and(|e| e.type_name == op.response.type_name);
    if is_empty {
        json!({ "description": description })
    } else {
        json!({
            "description": description,
            "content": { "application/json": { "schema": schema_ref(op.response.name) } },
        })
    }
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn detail_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "detail": { "type": "string" } },
        "required": ["detail"],
    })
}

fn validation_error_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "detail": { "type": "string" },
            "errors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "location": { "type": "string" },
                        "field": { "type": "string" },
                        "message": { "type": "string" },
                    },
                    "required": ["location", "field", "message"],
                },
            },
        },
        "required": ["detail", "errors"],
    })
}
