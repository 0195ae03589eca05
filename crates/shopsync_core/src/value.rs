//! Dynamic attribute value type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named field values of an entity, sorted by field name.
pub type Attributes = BTreeMap<String, Value>;

/// A single identifier or attribute value.
///
/// Equality is exact: `Null` never equals `Text("")`, and a text value
/// never equals a number, so a diff reports such pairs as changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number (prices).
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }

    /// Converts into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Converts a scalar JSON value. Arrays and objects map to `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Float)),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Builds an [`Attributes`] map from `name => value` pairs.
///
/// ```
/// use shopsync_core::{fields, Value};
///
/// let attrs = fields! { "name" => "Jacket", "price" => 12.5 };
/// assert_eq!(attrs["price"], Value::Float(12.5));
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Attributes::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Attributes::new();
        $( map.insert(::std::string::String::from($name), $crate::Value::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_not_empty_text() {
        assert_ne!(Value::Null, Value::from(""));
        assert_ne!(Value::from("1"), Value::Integer(1));
        assert_eq!(Value::from(Some("x")), Value::from("x"));
        assert_eq!(Value::from(None::<&str>), Value::Null);
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!(12);
        assert_eq!(Value::from_json(&json), Some(Value::Integer(12)));
        let json = serde_json::json!(12.5);
        assert_eq!(Value::from_json(&json), Some(Value::Float(12.5)));
        assert_eq!(Value::from_json(&serde_json::json!([1])), None);
        assert_eq!(Value::Float(1.5).to_json(), serde_json::json!(1.5));
    }

    #[test]
    fn untagged_serde() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"a": null, "b": "x", "c": 3, "d": 2.5, "e": true}"#).unwrap();
        assert_eq!(attrs["a"], Value::Null);
        assert_eq!(attrs["b"], Value::from("x"));
        assert_eq!(attrs["c"], Value::Integer(3));
        assert_eq!(attrs["d"], Value::Float(2.5));
        assert_eq!(attrs["e"], Value::Bool(true));
    }

    #[test]
    fn fields_macro() {
        let attrs = fields! { "name" => "Jacket", "price" => 1.0 };
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["name"].as_text(), Some("Jacket"));
        assert!(fields! {}.is_empty());
    }
}
