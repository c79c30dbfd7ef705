//! Ordered field → value mappings.

use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::value::Value;
use crate::error::ValueError;

/// One document: a flat, ordered mapping from field name to value.
///
/// Inserting an existing field replaces its value in place, keeping the
/// original position. Result rows use the same type, ordered by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Adds a field, builder-style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Gets a field's value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true if the record has the field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Removes a field, preserving the order of the rest.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in order.
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Iterates field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates values in field order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    /// Converts to a JSON object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Converts from a JSON object.
    ///
    /// Returns `Ok(None)` when the JSON value is not an object.
    pub fn from_json(json: JsonValue) -> Result<Option<Self>, ValueError> {
        let JsonValue::Object(map) = json else {
            return Ok(None);
        };
        let mut record = Record::with_capacity(map.len());
        for (field, value) in map {
            record.insert(field, Value::from_json(value)?);
        }
        Ok(Some(record))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_insertion_order() {
        let record = Record::new()
            .with("integer", 1)
            .with("floating_point", Value::from_f64(1.3).unwrap())
            .with("string", "stuff");

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["integer", "floating_point", "string"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        assert_eq!(record.insert("a", 3), Some(Value::Integer(1)));
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_from_json() {
        let record = Record::from_json(json!({"list": ["one", "two"]})).unwrap().unwrap();
        assert_eq!(record.get("list"), Some(&Value::from(vec!["one", "two"])));

        assert!(Record::from_json(json!([1, 2])).unwrap().is_none());
    }

    #[test]
    fn test_collect() {
        let record: Record = vec![("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.to_json(), json!({"x": 1, "y": 2}));
    }
}
