//! Schema catalog and relation graph

mod catalog;
mod relations;

pub use catalog::{EntityDef, RelationDef, RelationKind, SchemaCatalog, StaticCatalog};
pub use relations::{RelationMap, resolve_relations};
