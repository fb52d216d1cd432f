//! Filter tree definitions
//!
//! A filter tree is an ordered mapping of keys to values. The value shape is
//! decided once, when the tree is built from JSON; whether a mapping is a
//! relation sub-filter or an operator map depends on the relation map and is
//! decided at compile time.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Logical combinator keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }

    /// Separator placed between compiled sub-clauses
    pub fn separator(&self) -> &'static str {
        match self {
            Self::And | Self::Not => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Value stored under a filter key
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// `and` / `or` / `not` with its sub-filters
    Combinator(LogicalOp, Vec<FilterNode>),
    /// Sequence of values, compiled to a membership test
    Sequence(Vec<Value>),
    /// Nested object: relation sub-filter or operator map
    ///
    /// `raw` is the object as received. Operator operands are bound from it,
    /// so keys like `and` inside an operand are never reinterpreted.
    Mapping { node: FilterNode, raw: Map<String, Value> },
    /// Bare value, compiled to an equality test
    Scalar(Value),
}

/// Ordered filter mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterNode {
    entries: Vec<(String, FilterValue)>,
}

impl FilterValue {
    /// Classify a JSON value stored under `key`
    pub fn from_entry(key: &str, value: &Value) -> Self {
        if let Some(op) = LogicalOp::from_key(key) {
            let nodes = match value {
                Value::Array(items) => items.iter().map(FilterNode::from_json).collect(),
                other => vec![FilterNode::from_json(other)],
            };
            return Self::Combinator(op, nodes);
        }

        match value {
            Value::Array(items) => Self::Sequence(items.clone()),
            Value::Object(map) => Self::Mapping {
                node: FilterNode::from_map(map),
                raw: map.clone(),
            },
            scalar => Self::Scalar(scalar.clone()),
        }
    }

    /// Nesting depth below this value (a scalar has depth 0)
    pub fn depth(&self) -> usize {
        match self {
            Self::Combinator(_, nodes) => nodes.iter().map(FilterNode::depth).max().unwrap_or(0),
            Self::Mapping { node, .. } => node.depth(),
            Self::Sequence(_) | Self::Scalar(_) => 0,
        }
    }
}

impl FilterNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping insertion order. A repeated key replaces the
    /// earlier value in place.
    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Build a node from any JSON value. Non-objects become empty nodes.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .map(|(k, v)| (k.clone(), FilterValue::from_entry(k, v)))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Object nesting depth; `{}` and `{"a": 1}` have depth 1
    pub fn depth(&self) -> usize {
        1 + self.entries.iter().map(|(_, v)| v.depth()).max().unwrap_or(0)
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

impl From<Map<String, Value>> for FilterNode {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(&map)
    }
}
