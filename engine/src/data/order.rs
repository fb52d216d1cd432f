//! Ordering
//!
//! Order specs map keys to a direction, or for relation keys to a nested spec
//! keyed by the related entity's columns. Directions are passed to the query
//! builder as given.

use serde::Deserialize;

use crate::data::query::QueryBuilder;
use crate::data::schema::RelationMap;

/// Direction or nested order for one key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderValue {
    Direction(String),
    Nested(OrderSpec),
}

/// Ordered mapping of key to direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    entries: Vec<(String, OrderValue)>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: OrderValue) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &OrderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nesting depth; a flat spec has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .entries
            .iter()
            .map(|(_, v)| match v {
                OrderValue::Nested(spec) => spec.depth(),
                OrderValue::Direction(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

impl<'de> Deserialize<'de> for OrderSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // serde_json's preserve_order map keeps the caller's key order
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let value = OrderValue::deserialize(value).map_err(serde::de::Error::custom)?;
            entries.push((key, value));
        }
        Ok(Self { entries })
    }
}

/// Append ordering terms for `order` to `query`
///
/// - relation key with a nested spec: one term per inner key, qualified with
///   the relation alias
/// - relation key with a direction: qualified with the current alias
/// - any other key: qualified with the current alias
///
/// Inner entries that nest further are skipped.
pub fn apply_order<Q>(query: &mut Q, order: &OrderSpec, alias: &str, relations: &RelationMap)
where
    Q: QueryBuilder + ?Sized,
{
    for (key, value) in order.entries() {
        match value {
            OrderValue::Nested(inner) if relations.contains(key) => {
                for (column, inner_value) in inner.entries() {
                    match inner_value {
                        OrderValue::Direction(dir) => {
                            query.add_order_by(format!("{}.{}", key, column), dir);
                        }
                        OrderValue::Nested(_) => {
                            tracing::trace!(relation = key, column, "Nested order below relation skipped");
                        }
                    }
                }
            }
            OrderValue::Direction(dir) => {
                query.add_order_by(format!("{}.{}", alias, key), dir);
            }
            OrderValue::Nested(_) => {
                tracing::trace!(key, "Nested order on a non-relation key skipped");
            }
        }
    }
}
