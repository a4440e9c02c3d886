//! Attribute values as seen by the normaliser.
//!
//! OTLP attribute values carry many shapes (arrays, key/value lists, raw
//! bytes). The normaliser only distinguishes the four scalar kinds; anything
//! else is carried as [`AttributeValue::Other`] holding a string rendering, so
//! that copying it to a canonical key produces a string attribute.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use opentelemetry_proto::tonic::common::v1::{AnyValue, any_value};
use std::fmt;

/// A tagged attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// UTF-8 string.
    Str(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Double(f64),
    /// Boolean.
    Bool(bool),
    /// Any non-scalar value, rendered as a string.
    Other(String),
}

impl AttributeValue {
    /// Converts an OTLP value, rendering non-scalar kinds to strings.
    ///
    /// An absent value renders as the empty string.
    pub fn from_any(value: Option<&AnyValue>) -> Self {
        match value.and_then(|v| v.value.as_ref()) {
            Some(any_value::Value::StringValue(s)) => Self::Str(s.clone()),
            Some(any_value::Value::IntValue(i)) => Self::Int(*i),
            Some(any_value::Value::DoubleValue(d)) => Self::Double(*d),
            Some(any_value::Value::BoolValue(b)) => Self::Bool(*b),
            Some(other) => Self::Other(render(other)),
            None => Self::Other(String::new()),
        }
    }

    /// Converts into an OTLP value.
    ///
    /// [`AttributeValue::Other`] becomes a string value.
    pub fn into_any(self) -> AnyValue {
        let value = match self {
            Self::Str(s) | Self::Other(s) => any_value::Value::StringValue(s),
            Self::Int(i) => any_value::Value::IntValue(i),
            Self::Double(d) => any_value::Value::DoubleValue(d),
            Self::Bool(b) => any_value::Value::BoolValue(b),
        };
        AnyValue { value: Some(value) }
    }

    /// Returns the string content for `Str` and `Other` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Other(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a short name for the value kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Bool(_) => "bool",
            Self::Other(_) => "other",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Other(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Renders a non-scalar value the way collectors stringify them: arrays and
/// key/value lists as JSON text, bytes as standard base64.
fn render(value: &any_value::Value) -> String {
    match value {
        any_value::Value::StringValue(s) => s.clone(),
        any_value::Value::BytesValue(bytes) => STANDARD.encode(bytes),
        other => to_json(other).to_string(),
    }
}

fn to_json(value: &any_value::Value) -> serde_json::Value {
    match value {
        any_value::Value::StringValue(s) => serde_json::Value::String(s.clone()),
        any_value::Value::IntValue(i) => serde_json::Value::from(*i),
        any_value::Value::DoubleValue(d) => serde_json::Value::from(*d),
        any_value::Value::BoolValue(b) => serde_json::Value::Bool(*b),
        any_value::Value::BytesValue(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
        any_value::Value::ArrayValue(array) => serde_json::Value::Array(
            array
                .values
                .iter()
                .map(|v| v.value.as_ref().map_or(serde_json::Value::Null, to_json))
                .collect(),
        ),
        any_value::Value::KvlistValue(list) => serde_json::Value::Object(
            list.values
                .iter()
                .map(|kv| {
                    let value = kv
                        .value
                        .as_ref()
                        .and_then(|v| v.value.as_ref())
                        .map_or(serde_json::Value::Null, to_json);
                    (kv.key.clone(), value)
                })
                .collect(),
        ),
    }
}
