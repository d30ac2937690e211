//! Property values for nodes and edges

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single property value
///
/// Properties are schemaless key-value data carried by nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

/// Key-value properties attached to a node or edge
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Build a [`PropertyMap`] from `(key, value)` pairs
pub fn props<K, V, I>(pairs: I) -> PropertyMap
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(PropertyValue::from("x").as_str(), Some("x"));
        assert_eq!(PropertyValue::from(7i64).as_integer(), Some(7));
        assert_eq!(PropertyValue::from(2.5).as_float(), Some(2.5));
        assert_eq!(PropertyValue::from(true).as_boolean(), Some(true));
        assert!(PropertyValue::Null.is_null());
    }

    #[test]
    fn test_integer_widens_to_float() {
        assert_eq!(PropertyValue::Integer(3).as_float(), Some(3.0));
    }

    #[test]
    fn test_props_builder() {
        let map = props([("name", "alice"), ("city", "lisbon")]);
        assert_eq!(map.get("name").unwrap().as_str(), Some("alice"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let map = props([
            ("age", PropertyValue::Integer(30)),
            ("score", PropertyValue::Float(0.5)),
        ]);
        let json = serde_json::to_string(&map).unwrap();
        let back: PropertyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("age").unwrap().as_integer(), Some(30));
    }

    #[test]
    fn test_display() {
        let value = PropertyValue::Array(vec![1i64.into(), 2i64.into()]);
        assert_eq!(format!("{}", value), "[1, 2]");
    }
}
