//! Relation graph resolution
//!
//! Walks the catalog from a root entity and records, for every entity reached,
//! which property names are relations. Filter and order compilation use the
//! result to tell relation keys apart from plain columns.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::catalog::SchemaCatalog;

/// Recursive map of relation property name to the related entity's relations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelationMap(BTreeMap<String, RelationMap>);

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relations of the entity behind `property`, if `property` is a relation
    pub fn get(&self, property: &str) -> Option<&RelationMap> {
        self.0.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.0.contains_key(property)
    }

    pub fn insert(&mut self, property: impl Into<String>, relations: RelationMap) {
        self.0.insert(property.into(), relations);
    }

    pub fn with(mut self, property: impl Into<String>, relations: RelationMap) -> Self {
        self.insert(property, relations);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Build the relation map for `entity`
///
/// Depth-first over the catalog with a single visited set for the whole walk:
/// an entity that was already entered anywhere in the traversal resolves to an
/// empty map. This makes cyclic schemas terminate, at the cost of not listing
/// relations of an entity reached a second time.
pub fn resolve_relations(catalog: &dyn SchemaCatalog, entity: &str) -> RelationMap {
    let mut visited = HashSet::new();
    let relations = resolve_recursive(catalog, entity, &mut visited);
    tracing::trace!(
        entity,
        entities_visited = visited.len(),
        "Resolved relation graph"
    );
    relations
}

fn resolve_recursive(
    catalog: &dyn SchemaCatalog,
    entity: &str,
    visited: &mut HashSet<String>,
) -> RelationMap {
    if !visited.insert(entity.to_string()) {
        return RelationMap::new();
    }

    let mut map = RelationMap::new();
    for rel in catalog.relations(entity) {
        let nested = resolve_recursive(catalog, &rel.target, visited);
        map.insert(rel.property, nested);
    }
    map
}
