//! Join planning for relation filters
//!
//! Registers one inner join per relation level referenced by a filter tree,
//! aliased by the relation's property name. Must run before the WHERE clause
//! is compiled so every `property.column` reference has a join behind it.

use std::collections::HashSet;

use crate::data::query::QueryBuilder;
use crate::data::schema::RelationMap;

use super::types::{FilterNode, FilterValue};

/// Register the joins needed by `node`, returning how many were added
///
/// Sub-filters under `and`/`or`/`not` are walked with the same alias. A join
/// reached twice through different combinator branches is registered once.
pub fn join_relations<Q>(
    query: &mut Q,
    alias: &str,
    node: &FilterNode,
    relations: &RelationMap,
) -> usize
where
    Q: QueryBuilder + ?Sized,
{
    let mut registered = HashSet::new();
    join_recursive(query, alias, node, relations, &mut registered);
    registered.len()
}

fn join_recursive<Q>(
    query: &mut Q,
    alias: &str,
    node: &FilterNode,
    relations: &RelationMap,
    registered: &mut HashSet<(String, String)>,
) where
    Q: QueryBuilder + ?Sized,
{
    for (key, value) in node.entries() {
        if let FilterValue::Combinator(_, nodes) = value {
            for item in nodes {
                join_recursive(query, alias, item, relations, registered);
            }
            continue;
        }

        let Some(nested) = relations.get(key) else {
            continue;
        };

        let path = format!("{}.{}", alias, key);
        if registered.insert((path.clone(), key.to_string())) {
            tracing::trace!(path = %path, alias = key, "Registering inner join");
            query.inner_join(&path, key);
        }

        if let FilterValue::Mapping { node: sub_node, .. } = value {
            join_recursive(query, key, sub_node, nested, registered);
        }
    }
}
