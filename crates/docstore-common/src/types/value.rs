//! The caller-facing value model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::ValueError;

/// Runtime kind of a [`Value`].
///
/// Schema inference dispatches on this closed set; see
/// [`StorageType::infer`](crate::StorageType::infer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// SQL NULL / JSON null.
    Null,
    /// Boolean.
    Boolean,
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Ordered list of values.
    Sequence,
    /// String-keyed map of values.
    Map,
}

impl ValueKind {
    /// Returns a lowercase name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Sequence => "sequence",
            ValueKind::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value inside a [`Record`](crate::Record) or a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Decimal value.
    Decimal(Decimal),
    /// List of values, stored as JSON.
    List(Vec<Value>),
    /// Map of values in insertion order, stored as JSON.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Text(_) => ValueKind::Text,
            Value::Integer(_) => ValueKind::Integer,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::List(_) => ValueKind::Sequence,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Returns true if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for values stored as JSON.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Tries to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Tries to get as integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    /// Tries to get as decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Tries to get as float (lossy for decimals).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Decimal(d) => d.to_f64(),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Tries to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Tries to get as list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Tries to get as map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Creates a decimal value from a float.
    ///
    /// The shortest decimal representation that round-trips the float is
    /// kept, so `1.3` becomes exactly `1.3`.
    pub fn from_f64(value: f64) -> Result<Self, ValueError> {
        decimal_from_f64(value).map(Value::Decimal)
    }

    /// Converts to a JSON value.
    ///
    /// Decimals without a fractional part become JSON integers; others
    /// become JSON floats.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Decimal(d) => decimal_to_json(d),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Serializes to JSON text, the form structured values are bound as.
    pub fn to_json_text(&self) -> String {
        self.to_json().to_string()
    }

    /// Converts from a JSON value.
    pub fn from_json(json: JsonValue) -> Result<Self, ValueError> {
        Ok(match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Decimal(Decimal::from(u))
                } else {
                    let text = n.to_string();
                    let decimal = Decimal::from_str(&text)
                        .or_else(|_| Decimal::from_scientific(&text))
                        .map_err(|_| ValueError::OutOfRange(text))?;
                    Value::Decimal(decimal)
                }
            }
            JsonValue::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Parses JSON text into a value.
    pub fn parse_json(text: &str) -> Option<Self> {
        serde_json::from_str::<JsonValue>(text)
            .ok()
            .and_then(|json| Value::from_json(json).ok())
    }
}

/// Converts a finite float to its shortest round-tripping decimal.
fn decimal_from_f64(value: f64) -> Result<Decimal, ValueError> {
    if !value.is_finite() {
        return Err(ValueError::NonFinite(value));
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .ok_or_else(|| ValueError::OutOfRange(value.to_string()))
}

fn decimal_to_json(d: &Decimal) -> JsonValue {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return JsonValue::from(i);
        }
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(d.to_string()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl TryFrom<f64> for Value {
    type Error = ValueError;

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Value::from_f64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(v: IndexMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = ValueError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Value::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(7).kind(), ValueKind::Integer);
        assert_eq!(Value::from_f64(1.5).unwrap().kind(), ValueKind::Decimal);
        assert_eq!(Value::from(vec!["a", "b"]).kind(), ValueKind::Sequence);
        assert_eq!(Value::from(BTreeMap::from([("k".to_string(), 1)])).kind(), ValueKind::Map);
    }

    #[test]
    fn test_from_f64_keeps_short_representation() {
        let value = Value::from_f64(1.3).unwrap();
        assert_eq!(value, Value::Decimal(Decimal::from_str("1.3").unwrap()));
        assert_eq!(value.to_string(), "1.3");
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(matches!(Value::from_f64(f64::NAN), Err(ValueError::NonFinite(_))));
        assert!(Value::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from_json(json!({"list": ["one", "two"], "n": 3, "f": 2.5})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["list"], Value::from(vec!["one", "two"]));
        assert_eq!(map["n"], Value::Integer(3));
        assert_eq!(map["f"], Value::Decimal(Decimal::from_str("2.5").unwrap()));

        assert_eq!(value.to_json(), json!({"f": 2.5, "list": ["one", "two"], "n": 3}));
    }

    #[test]
    fn test_map_keeps_field_order() {
        let value = Value::parse_json(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(value.to_json_text(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn test_json_text() {
        let value = Value::from(vec!["one", "two"]);
        assert_eq!(value.to_json_text(), r#"["one","two"]"#);
        assert_eq!(Value::parse_json(r#"["one","two"]"#), Some(value));
        assert_eq!(Value::parse_json("not json"), None);
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Integer(4).as_decimal(), Some(Decimal::from(4)));
        assert_eq!(Value::Decimal(Decimal::from(4)).as_i64(), Some(4));
        assert_eq!(Value::from_f64(4.5).unwrap().as_i64(), None);
        assert_eq!(Value::from_f64(2.5).unwrap().as_f64(), Some(2.5));
        assert!(Value::from("4").as_i64().is_none());
    }
}
