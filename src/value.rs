//! The schema-free value tree exchanged with everything above the codec.
//!
//! A [`Value`] is what [`from_xml`](crate::convert::from_xml) produces and
//! what [`to_xml`](crate::convert::to_xml) consumes. Scalars are always
//! strings: the decoder never guesses whether `"1"` is a number or `"true"`
//! a boolean, that interpretation belongs to the caller.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered map from tag name to value. Insertion order is the order the
/// encoder emits child tags in.
pub type Mapping = IndexMap<String, Value>;

/// A decoded document node.
///
/// Serializes as plain JSON: a string, an array or an object.
///
/// Note the cardinality collapse performed by the decoder: a tag that
/// appears once under its parent decodes to its value directly, a tag that
/// appears two or more times decodes to a `Sequence`. A one-item list and a
/// naturally singular child are therefore indistinguishable after decoding.
/// Use [`Value::as_list`] where either shape is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Trimmed element text, or `""` for an empty element.
    Scalar(String),
    /// Repeated sibling elements sharing one tag, in document order.
    Sequence(Vec<Value>),
    /// Child elements keyed by tag name.
    Mapping(Mapping),
}

impl Value {
    /// An empty mapping, ready for [`Value::insert`].
    pub fn mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    /// Returns the scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the children, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a child by tag name. `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Follows a chain of tag names, e.g. `["policy", "general", "name"]`.
    pub fn pointer<'a, I>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter().try_fold(self, |node, key| node.get(key))
    }

    /// Views the value as a list: the items of a sequence, or the value
    /// itself as the only item.
    ///
    /// This does not undo the cardinality collapse, it only lets callers
    /// iterate "one or many" children without matching on both shapes.
    pub fn as_list(&self) -> Vec<&Value> {
        match self {
            Value::Sequence(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Inserts a child into a mapping, returning the previous value.
    ///
    /// Has no effect (and returns `None`) on scalars and sequences.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        match self {
            Value::Mapping(map) => map.insert(key.into(), value.into()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(if b { "true" } else { "false" }.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Value::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Converts arbitrary JSON into a value tree for encoding.
///
/// `null` becomes the empty scalar, booleans render as `true`/`false`,
/// numbers use their JSON text.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Scalar(String::new()),
            serde_json::Value::Bool(b) => b.into(),
            serde_json::Value::Number(n) => Value::Scalar(n.to_string()),
            serde_json::Value::String(s) => Value::Scalar(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => map.into_iter().collect(),
        }
    }
}
