//! Structured values exchanged with the orchestration engine.
//!
//! Configuration, state, identity and function arguments all travel as a
//! [`Value`]: a JSON-like tree extended with an explicit [`Value::Unknown`]
//! marker for attributes whose value is only decided at apply time.
//!
//! Raw state handed to the provider for upgrade is JSON. It is decoded
//! against the type implied by the current schema with [`Value::decode_json`],
//! which rejects payloads that do not conform to that type.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::schema::AttributeType;

/// A possibly-nested structured value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Null,
    /// A value that is not known until apply.
    Unknown,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An ordered sequence (lists, sets and tuples).
    List(Vec<Value>),
    /// A set of named attributes (objects and maps).
    Object(BTreeMap<String, Value>),
}

/// Errors produced when raw JSON cannot be decoded against a type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A value does not have the expected type.
    #[error("{path}: expected {expected}, got {found}")]
    TypeMismatch {
        /// Attribute path of the offending value.
        path: String,
        /// The type the schema requires.
        expected: &'static str,
        /// The JSON type that was found.
        found: &'static str,
    },

    /// An object carries an attribute the schema does not declare.
    #[error("{path}: unsupported attribute")]
    UnsupportedAttribute {
        /// Attribute path of the undeclared attribute.
        path: String,
    },
}

impl Value {
    /// Create a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create an object value from `(name, value)` pairs.
    pub fn object<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Object(
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` unless this value itself is [`Value::Unknown`].
    ///
    /// Nested values are not inspected; see [`Value::is_wholly_known`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns `true` if neither this value nor anything nested in it is unknown.
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Self::Unknown => false,
            Self::List(items) => items.iter().all(Value::is_wholly_known),
            Self::Object(attrs) => attrs.values().all(Value::is_wholly_known),
            _ => true,
        }
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an attribute of an object value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(attrs) => attrs.get(name),
            _ => None,
        }
    }

    /// Take the attribute map of an object value.
    ///
    /// Null (and any non-object value) yields an empty map.
    pub fn into_attributes(self) -> BTreeMap<String, Value> {
        match self {
            Self::Object(attrs) => attrs,
            _ => BTreeMap::new(),
        }
    }

    /// Decode raw JSON against the given type.
    pub fn decode_json(raw: &[u8], ty: &AttributeType) -> Result<Self, DecodeError> {
        let json: serde_json::Value = serde_json::from_slice(raw)?;
        Self::from_json_typed(json, ty, "")
    }

    /// Convert JSON to a value, checking it against `ty`.
    pub fn from_json_typed(
        json: serde_json::Value,
        ty: &AttributeType,
        path: &str,
    ) -> Result<Self, DecodeError> {
        use serde_json::Value as Json;

        match (ty, json) {
            (_, Json::Null) => Ok(Self::Null),
            (AttributeType::Dynamic, json) => Ok(Self::from(json)),
            (AttributeType::String, Json::String(s)) => Ok(Self::String(s)),
            (AttributeType::Number, Json::Number(n)) => Ok(Self::Number(n)),
            (AttributeType::Bool, Json::Bool(b)) => Ok(Self::Bool(b)),
            (AttributeType::List(elem) | AttributeType::Set(elem), Json::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Self::from_json_typed(item, elem, &join_path(path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            (AttributeType::Map(elem), Json::Object(entries)) => entries
                .into_iter()
                .map(|(key, item)| {
                    let item = Self::from_json_typed(item, elem, &join_path(path, &key))?;
                    Ok((key, item))
                })
                .collect::<Result<BTreeMap<_, _>, DecodeError>>()
                .map(Self::Object),
            (AttributeType::Object(attrs), Json::Object(mut entries)) => {
                if let Some(extra) = entries.keys().find(|k| !attrs.contains_key(*k)) {
                    return Err(DecodeError::UnsupportedAttribute {
                        path: display_path(&join_path(path, extra)),
                    });
                }
                attrs
                    .iter()
                    .map(|(name, attr_type)| {
                        let item = entries.remove(name).unwrap_or(Json::Null);
                        let item = Self::from_json_typed(item, attr_type, &join_path(path, name))?;
                        Ok((name.clone(), item))
                    })
                    .collect::<Result<BTreeMap<_, _>, DecodeError>>()
                    .map(Self::Object)
            },
            (ty, json) => Err(DecodeError::TypeMismatch {
                path: display_path(path),
                expected: ty.name(),
                found: json_kind(&json),
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(n),
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => {
                Self::Object(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(attrs: BTreeMap<String, Value>) -> Self {
        Self::Object(attrs)
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple_object_type() -> AttributeType {
        AttributeType::object([
            ("id".to_string(), AttributeType::String),
            ("value".to_string(), AttributeType::String),
        ])
    }

    #[test]
    fn test_decode_fills_missing_attributes_with_null() {
        let value = Value::decode_json(br#"{"value": "x"}"#, &simple_object_type()).unwrap();
        assert_eq!(value.get("value"), Some(&Value::string("x")));
        assert_eq!(value.get("id"), Some(&Value::Null));
    }

    #[test]
    fn test_decode_rejects_undeclared_attribute() {
        let err = Value::decode_json(br#"{"other": "x"}"#, &simple_object_type()).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedAttribute { ref path } if path == "other"));
    }

    #[test]
    fn test_decode_rejects_type_mismatch() {
        let err = Value::decode_json(br#"{"id": 42}"#, &simple_object_type()).unwrap_err();
        assert_eq!(err.to_string(), "id: expected string, got number");

        let err = Value::decode_json(br#"["a"]"#, &simple_object_type()).unwrap_err();
        assert_eq!(err.to_string(), "<root>: expected object, got array");
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = Value::decode_json(b"{not json", &simple_object_type()).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn test_decode_nested_collections() {
        let ty = AttributeType::object([(
            "tags".to_string(),
            AttributeType::map(AttributeType::list(AttributeType::Number)),
        )]);
        let value = Value::decode_json(br#"{"tags": {"a": [1, 2]}}"#, &ty).unwrap();
        assert_eq!(
            value,
            Value::object([(
                "tags",
                Value::object([("a", Value::from(json!([1, 2])))])
            )])
        );

        let err = Value::decode_json(br#"{"tags": {"a": [1, "two"]}}"#, &ty).unwrap_err();
        assert_eq!(err.to_string(), "tags.a.1: expected number, got string");
    }

    #[test]
    fn test_dynamic_accepts_anything() {
        let value = Value::decode_json(br#"{"any": [true, null]}"#, &AttributeType::Dynamic)
            .unwrap();
        assert_eq!(value, Value::from(json!({"any": [true, null]})));
    }

    #[test]
    fn test_knownness() {
        assert!(!Value::Unknown.is_known());
        assert!(Value::Null.is_known());

        let nested = Value::object([("id", Value::Unknown)]);
        assert!(nested.is_known());
        assert!(!nested.is_wholly_known());
    }

    #[test]
    fn test_into_attributes_of_null_is_empty() {
        assert!(Value::Null.into_attributes().is_empty());
        let attrs = Value::object([("a", Value::Bool(true))]).into_attributes();
        assert_eq!(attrs.len(), 1);
    }
}
