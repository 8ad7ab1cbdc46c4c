use crate::dataclass::{dataclass_of, DataclassInfo, FieldType, Schema};
use crate::server::ParamVec;
use crate::validator::{FieldErrors, ValidationIssue, NON_FIELD_ERRORS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Where validated data came from; reported as `location` on each issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Query,
    Body,
    Path,
    Response,
}

impl Location {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::Body => "body",
            Location::Path => "path",
            Location::Response => "response",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate `raw` against the dataclass `T` and build it.
///
/// All field problems are collected before returning. Unknown keys are ignored.
pub fn validate<T>(raw: &Value, location: Location) -> Result<T, FieldErrors>
where
    T: Schema + DeserializeOwned,
{
    let info = dataclass_of::<T>().ok_or_else(|| {
        FieldErrors::single(
            location.as_str(),
            NON_FIELD_ERRORS,
            format!("`{}` must be a dataclass", std::any::type_name::<T>()),
        )
    })?;

    let mut errors = FieldErrors::new();
    check_dataclass(&info, raw, "", location, &mut errors);
    if !errors.is_empty() {
        debug!(
            dataclass = info.name,
            location = %location,
            issues = errors.len(),
            "Validation failed"
        );
        return Err(errors);
    }

    T::deserialize(raw).map_err(|err| {
        FieldErrors::single(location.as_str(), NON_FIELD_ERRORS, err.to_string())
    })
}

/// Serialize a dataclass and check the result against its own declaration.
///
/// A mismatch here is a programming error in the view (for example a
/// non-finite float, which JSON can only carry as `null`).
pub fn serialize<T>(value: &T) -> Result<Value, FieldErrors>
where
    T: Schema + Serialize,
{
    let location = Location::Response.as_str();
    let raw = serde_json::to_value(value)
        .map_err(|err| FieldErrors::single(location, NON_FIELD_ERRORS, err.to_string()))?;

    let Some(info) = dataclass_of::<T>() else {
        return Err(FieldErrors::single(
            location,
            NON_FIELD_ERRORS,
            "response must be a dataclass",
        ));
    };

    let mut errors = FieldErrors::new();
    check_dataclass(&info, &raw, "", Location::Response, &mut errors);
    if errors.is_empty() {
        Ok(raw)
    } else {
        Err(errors)
    }
}

/// Turn string pairs (query string, path captures, form body) into a JSON object
/// shaped for `info`.
///
/// Scalars are converted per field type; a value that does not parse is left as a
/// string so validation reports it. List fields gather every occurrence of their
/// key; other fields keep the last one.
#[must_use]
pub fn coerce_params(info: &DataclassInfo, params: &ParamVec) -> Value {
    let mut obj = Map::new();
    for (name, raw) in params {
        let key: &str = name;
        match info.field(key) {
            Some(field) => match list_item_type(&field.ty) {
                Some(item) => {
                    let entry = obj
                        .entry(key.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(items) = entry {
                        items.push(coerce_scalar(item, raw));
                    }
                }
                None => {
                    obj.insert(key.to_string(), coerce_scalar(&field.ty, raw));
                }
            },
            None => {
                obj.insert(key.to_string(), Value::String(raw.clone()));
            }
        }
    }
    Value::Object(obj)
}

fn list_item_type(ty: &FieldType) -> Option<&FieldType> {
    match ty {
        FieldType::List(inner) => Some(&**inner),
        FieldType::Optional(inner) => list_item_type(inner),
        _ => None,
    }
}

fn coerce_scalar(ty: &FieldType, raw: &str) -> Value {
    let keep = || Value::String(raw.to_string());
    match ty {
        FieldType::Integer { .. } => {
            let raw = raw.trim();
            match (raw.parse::<i64>(), raw.parse::<u64>()) {
                (Ok(n), _) => Value::from(n),
                (_, Ok(n)) => Value::from(n),
                _ => keep(),
            }
        }
        FieldType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(keep),
        FieldType::Boolean => parse_bool(raw).map(Value::Bool).unwrap_or_else(keep),
        FieldType::Optional(inner) => {
            if raw.is_empty() && !matches!(**inner, FieldType::String) {
                Value::Null
            } else {
                coerce_scalar(inner, raw)
            }
        }
        _ => keep(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn push(errors: &mut FieldErrors, location: Location, field: &str, message: impl Into<String>) {
    errors.push(ValidationIssue::new(location.as_str(), field, message));
}

fn check_dataclass(
    info: &DataclassInfo,
    value: &Value,
    prefix: &str,
    location: Location,
    errors: &mut FieldErrors,
) {
    let Value::Object(obj) = value else {
        let field = if prefix.is_empty() {
            NON_FIELD_ERRORS
        } else {
            prefix
        };
        push(
            errors,
            location,
            field,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type(value)
            ),
        );
        return;
    };

    for field in &info.fields {
        let required = if location == Location::Response {
            field.is_always_written()
        } else {
            field.is_required()
        };
        let path = join(prefix, field.name);
        match obj.get(field.name) {
            None if required => {
                push(errors, location, &path, "This field is required.");
            }
            None => {}
            Some(v) => check_value(&field.ty, v, &path, location, errors),
        }
    }
}

fn integer_value(n: &serde_json::Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn check_value(
    ty: &FieldType,
    value: &Value,
    path: &str,
    location: Location,
    errors: &mut FieldErrors,
) {
    match (ty, value) {
        (FieldType::Optional(_), Value::Null) => {}
        (FieldType::Optional(inner), v) => check_value(inner, v, path, location, errors),
        (_, Value::Null) => push(errors, location, path, "This field may not be null."),
        (FieldType::String, Value::String(_)) => {}
        (FieldType::String, _) => push(errors, location, path, "Not a valid string."),
        (FieldType::Integer { min, max }, Value::Number(n)) => match integer_value(n) {
            Some(v) if v < *min => push(
                errors,
                location,
                path,
                format!("Ensure this value is greater than or equal to {min}."),
            ),
            Some(v) if v > *max => push(
                errors,
                location,
                path,
                format!("Ensure this value is less than or equal to {max}."),
            ),
            Some(_) => {}
            None => push(errors, location, path, "A valid integer is required."),
        },
        (FieldType::Integer { .. }, _) => {
            push(errors, location, path, "A valid integer is required.");
        }
        (FieldType::Number, Value::Number(_)) => {}
        (FieldType::Number, _) => push(errors, location, path, "A valid number is required."),
        (FieldType::Boolean, Value::Bool(_)) => {}
        (FieldType::Boolean, _) => push(errors, location, path, "Must be a valid boolean."),
        (FieldType::List(inner), Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                check_value(inner, item, &join(path, &idx.to_string()), location, errors);
            }
        }
        (FieldType::List(_), v) => push(
            errors,
            location,
            path,
            format!("Expected a list of items but got type \"{}\".", json_type(v)),
        ),
        (FieldType::Map(inner), Value::Object(entries)) => {
            for (key, item) in entries {
                check_value(inner, item, &join(path, key), location, errors);
            }
        }
        (FieldType::Map(_), v) => push(
            errors,
            location,
            path,
            format!(
                "Expected a dictionary of items but got type \"{}\".",
                json_type(v)
            ),
        ),
        (FieldType::Dataclass(info), v) => check_dataclass(&info(), v, path, location, errors),
    }
}
