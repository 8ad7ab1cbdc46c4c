use crate::error::CollectionError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Types whose fields are described by [`DataclassInfo`].
///
/// Implemented by `#[derive(Dataclass)]`; hand-written impls are possible but the
/// derive keeps the metadata in sync with the `serde` wire shape.
pub trait Dataclass {
    fn dataclass_info() -> DataclassInfo;
}

/// Maps a Rust type onto the [`FieldType`] used for validation and schemas.
pub trait Schema {
    fn field_type() -> FieldType;
}

/// Wire type of a field.
#[derive(Clone)]
pub enum FieldType {
    String,
    /// Inclusive bounds of the Rust integer type
    Integer { min: i128, max: i128 },
    Number,
    Boolean,
    Optional(Box<FieldType>),
    List(Box<FieldType>),
    /// String-keyed mapping with homogeneous values
    Map(Box<FieldType>),
    /// Resolved lazily so self-referential dataclasses do not recurse forever
    Dataclass(fn() -> DataclassInfo),
}

impl FieldType {
    /// The dataclass behind this type, if it is one (not looking through `Option`).
    #[must_use]
    pub fn dataclass(&self) -> Option<DataclassInfo> {
        match self {
            FieldType::Dataclass(info) => Some(info()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// JSON Schema (OpenAPI 3.1 dialect) for a value of this type.
    ///
    /// Dataclasses are emitted as `$ref`s into `#/components/schemas`.
    #[must_use]
    pub fn schema(&self) -> Value {
        match self {
            FieldType::String => json!({ "type": "string" }),
            FieldType::Integer { min, max } => integer_schema(*min, *max),
            FieldType::Number => json!({ "type": "number" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::Optional(inner) => {
                let mut schema = inner.schema();
                match schema.get("type").and_then(Value::as_str).map(str::to_string) {
                    Some(ty) => {
                        schema["type"] = json!([ty, "null"]);
                        schema
                    }
                    None => json!({ "anyOf": [schema, { "type": "null" }] }),
                }
            }
            FieldType::List(inner) => json!({ "type": "array", "items": inner.schema() }),
            FieldType::Map(inner) => {
                json!({ "type": "object", "additionalProperties": inner.schema() })
            }
            FieldType::Dataclass(info) => {
                json!({ "$ref": format!("#/components/schemas/{}", info().name) })
            }
        }
    }
}

/// Bounds wider than a signed 64-bit integer are left implicit.
fn integer_schema(min: i128, max: i128) -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("integer"));
    if min > i128::from(i64::MIN) {
        schema.insert("minimum".to_string(), bound(min));
    }
    if max < i128::from(i64::MAX) {
        schema.insert("maximum".to_string(), bound(max));
    }
    Value::Object(schema)
}

fn bound(n: i128) -> Value {
    i64::try_from(n).map_or_else(|_| json!(n.to_string()), Value::from)
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Integer { min, max } => write!(f, "Integer({min}..={max})"),
            FieldType::Number => write!(f, "Number"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::Optional(inner) => write!(f, "Optional({inner:?})"),
            FieldType::List(inner) => write!(f, "List({inner:?})"),
            FieldType::Map(inner) => write!(f, "Map({inner:?})"),
            FieldType::Dataclass(info) => write!(f, "Dataclass({})", info().name),
        }
    }
}

/// Whether serializing a value writes the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutput {
    Always,
    /// `skip_serializing_if`: may be left out of a response
    Conditional,
    /// `skip_serializing`: accepted on input, never written
    Never,
}

/// One field of a dataclass, keyed by its serialized name.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: &'static str,
    pub ty: FieldType,
    pub has_default: bool,
    pub output: FieldOutput,
    pub description: Option<&'static str>,
}

impl FieldInfo {
    /// Required in input: neither `Option` nor defaulted.
    #[must_use]
    pub fn is_required(&self) -> bool {
        !self.has_default && !self.ty.is_optional()
    }

    /// Required in a serialized value of the dataclass.
    #[must_use]
    pub fn is_always_written(&self) -> bool {
        self.is_required() && self.output == FieldOutput::Always
    }

    #[must_use]
    pub fn is_write_only(&self) -> bool {
        self.output == FieldOutput::Never
    }
}

/// Field metadata of a dataclass, produced by `#[derive(Dataclass)]`.
#[derive(Debug, Clone)]
pub struct DataclassInfo {
    /// Short name, used as the schema component name
    pub name: &'static str,
    /// Fully qualified Rust type name; distinguishes same-named dataclasses
    pub type_name: &'static str,
    pub description: Option<&'static str>,
    pub fields: Vec<FieldInfo>,
}

impl DataclassInfo {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Object schema for `components.schemas`.
    #[must_use]
    pub fn schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut schema = field.ty.schema();
            if let Value::Object(obj) = &mut schema {
                if !obj.contains_key("$ref") {
                    if let Some(desc) = field.description {
                        obj.insert("description".to_string(), Value::String(desc.to_string()));
                    }
                    if field.is_write_only() {
                        obj.insert("writeOnly".to_string(), Value::Bool(true));
                    }
                }
            }
            properties.insert(field.name.to_string(), schema);
            if field.is_required() {
                required.push(Value::String(field.name.to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        if let Some(desc) = self.description {
            schema.insert("description".to_string(), json!(desc));
        }
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Add this dataclass and every dataclass reachable from its fields to
    /// `registry`, keyed by short name.
    ///
    /// Two distinct Rust types with the same short name would share one schema
    /// component, so that is reported as [`CollectionError::NameInUse`].
    pub fn collect_into(
        &self,
        registry: &mut BTreeMap<&'static str, DataclassInfo>,
    ) -> Result<(), CollectionError> {
        if let Some(existing) = registry.get(self.name) {
            if existing.type_name != self.type_name {
                return Err(CollectionError::NameInUse {
                    name: self.name.to_string(),
                    existing: existing.type_name.to_string(),
                    new: self.type_name.to_string(),
                });
            }
            return Ok(());
        }
        registry.insert(self.name, self.clone());
        for field in &self.fields {
            collect_field_type(&field.ty, registry)?;
        }
        Ok(())
    }
}

fn collect_field_type(
    ty: &FieldType,
    registry: &mut BTreeMap<&'static str, DataclassInfo>,
) -> Result<(), CollectionError> {
    match ty {
        FieldType::Optional(inner) | FieldType::List(inner) | FieldType::Map(inner) => {
            collect_field_type(inner, registry)
        }
        FieldType::Dataclass(info) => info().collect_into(registry),
        _ => Ok(()),
    }
}

/// The dataclass info of `T`, or `None` when `T` is not a dataclass.
#[must_use]
pub fn dataclass_of<T: Schema>() -> Option<DataclassInfo> {
    T::field_type().dataclass()
}

/// Response type for views that return no content.
///
/// Serializes as `{}`; with a `204` status the body is dropped entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, crate::Dataclass)]
pub struct Empty {}

macro_rules! impl_schema {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl Schema for $ty {
                fn field_type() -> FieldType {
                    FieldType::$variant
                }
            }
        )+
    };
}

macro_rules! impl_integer_schema {
    ($($ty:ty),+) => {
        $(
            impl Schema for $ty {
                fn field_type() -> FieldType {
                    FieldType::Integer {
                        min: <$ty>::MIN as i128,
                        max: <$ty>::MAX as i128,
                    }
                }
            }
        )+
    };
}

impl_schema!(String => String);
impl_schema!(Boolean => bool);
impl_integer_schema!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_schema!(Number => f32, f64);

impl<T: Schema> Schema for Option<T> {
    fn field_type() -> FieldType {
        FieldType::Optional(Box::new(T::field_type()))
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::List(Box::new(T::field_type()))
    }
}

impl<T: Schema> Schema for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }
}

impl<T: Schema> Schema for BTreeMap<String, T> {
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(T::field_type()))
    }
}

impl<T: Schema, S> Schema for HashMap<String, T, S> {
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(T::field_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataclass;

    #[derive(Debug, Serialize, Deserialize, Dataclass)]
    struct Child {
        v: String,
    }

    /// Holds a child
    #[derive(Debug, Serialize, Deserialize, Dataclass)]
    struct Parent {
        c: Child,
        /// Optional nickname
        nickname: Option<String>,
        #[serde(default)]
        scores: Vec<i64>,
        #[serde(rename = "type")]
        kind: String,
    }

    #[derive(Debug, Serialize, Deserialize, Dataclass)]
    struct Node {
        label: String,
        children: Vec<Node>,
    }

    mod other {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize, crate::Dataclass)]
        pub struct Child {
            w: i64,
        }
    }

    #[test]
    fn test_derive_records_fields() {
        let info = Parent::dataclass_info();
        assert_eq!(info.name, "Parent");
        assert_eq!(info.description, Some("Holds a child"));
        let names: Vec<_> = info.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["c", "nickname", "scores", "type"]);

        assert!(info.field("c").is_some_and(FieldInfo::is_required));
        assert!(info.field("nickname").is_some_and(|f| !f.is_required()));
        assert!(info.field("scores").is_some_and(|f| !f.is_required()));
        assert_eq!(
            info.field("nickname").and_then(|f| f.description),
            Some("Optional nickname")
        );
    }

    #[test]
    fn test_schema_for_nested_and_optional() {
        let schema = Parent::dataclass_info().schema();
        assert_eq!(
            schema["properties"]["c"],
            json!({ "$ref": "#/components/schemas/Child" })
        );
        assert_eq!(schema["properties"]["nickname"]["type"], json!(["string", "null"]));
        assert_eq!(schema["properties"]["scores"]["items"], json!({ "type": "integer" }));
        assert_eq!(schema["required"], json!(["c", "type"]));
    }

    #[test]
    fn test_integer_bounds_follow_the_rust_type() {
        assert_eq!(
            u8::field_type().schema(),
            json!({ "type": "integer", "minimum": 0, "maximum": 255 })
        );
        assert_eq!(
            Option::<i16>::field_type().schema(),
            json!({ "type": ["integer", "null"], "minimum": -32768, "maximum": 32767 })
        );
        assert_eq!(u64::field_type().schema(), json!({ "type": "integer", "minimum": 0 }));
        assert_eq!(i64::field_type().schema(), json!({ "type": "integer" }));
    }

    #[derive(Debug, Serialize, Deserialize, Dataclass)]
    struct Credentials {
        user: String,
        #[serde(skip_serializing)]
        password: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        roles: Vec<String>,
    }

    #[test]
    fn test_serialization_skips_are_recorded() {
        let info = Credentials::dataclass_info();
        let password = info.field("password").unwrap();
        assert_eq!(password.output, FieldOutput::Never);
        assert!(password.is_required() && !password.is_always_written());

        let roles = info.field("roles").unwrap();
        assert_eq!(roles.output, FieldOutput::Conditional);
        assert!(roles.is_required() && !roles.is_always_written());

        let schema = info.schema();
        assert_eq!(schema["properties"]["password"]["writeOnly"], true);
        assert!(schema["properties"]["user"].get("writeOnly").is_none());
    }

    #[test]
    fn test_collect_nested_and_recursive() {
        let mut registry = BTreeMap::new();
        Parent::dataclass_info().collect_into(&mut registry).unwrap();
        assert!(registry.contains_key("Parent"));
        assert!(registry.contains_key("Child"));

        let mut registry = BTreeMap::new();
        Node::dataclass_info().collect_into(&mut registry).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collect_rejects_reused_name() {
        let mut registry = BTreeMap::new();
        Child::dataclass_info().collect_into(&mut registry).unwrap();
        let err = other::Child::dataclass_info()
            .collect_into(&mut registry)
            .unwrap_err();
        assert!(err.to_string().contains("Name already in use"));
    }

    #[test]
    fn test_empty_is_a_dataclass() {
        let info = dataclass_of::<Empty>().unwrap();
        assert_eq!(info.name, "Empty");
        assert!(info.fields.is_empty());
        assert_eq!(serde_json::to_value(Empty {}).unwrap(), json!({}));
        assert!(dataclass_of::<String>().is_none());
    }
}
