//! Schema catalog
//!
//! Declares which properties of an entity are relations and to which entity
//! they point. The compiler only needs the (property, target) pairs; the
//! table and join column information is used by the SQL renderer.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::data::error::CatalogError;
use crate::utils::string::to_snake_case;

/// Source of relation declarations for entities
pub trait SchemaCatalog {
    /// Relations declared on `entity`, in declaration order.
    /// Unknown entities have no relations.
    fn relations(&self, entity: &str) -> Vec<RelationDef>;

    /// Table backing `entity`
    fn table(&self, entity: &str) -> String {
        to_snake_case(entity)
    }
}

/// Relation cardinality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    #[default]
    ManyToOne,
    OneToMany,
}

impl RelationKind {
    /// Whether the owning side holds the foreign key
    pub fn is_to_one(&self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }
}

/// A relation declared on an entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDef {
    pub property: String,
    pub target: String,
    #[serde(default)]
    pub kind: RelationKind,
    pub local_column: Option<String>,
    pub foreign_column: Option<String>,
}

impl RelationDef {
    pub fn new(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            target: target.into(),
            kind: RelationKind::default(),
            local_column: None,
            foreign_column: None,
        }
    }

    pub fn with_kind(mut self, kind: RelationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Join column on the owning entity's table
    pub fn local_column(&self) -> String {
        match &self.local_column {
            Some(col) => col.clone(),
            None if self.kind.is_to_one() => format!("{}_id", self.property),
            None => "id".to_string(),
        }
    }

    /// Join column on the target entity's table
    pub fn foreign_column(&self, owner: &str) -> String {
        match &self.foreign_column {
            Some(col) => col.clone(),
            None if self.kind.is_to_one() => "id".to_string(),
            None => format!("{}_id", to_snake_case(owner)),
        }
    }
}

/// Entity entry of a static catalog
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    pub table: Option<String>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

/// Catalog supplied up front as data (typically a JSON file)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticCatalog {
    #[serde(default)]
    pub entities: HashMap<String, EntityDef>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, replacing any previous definition
    pub fn with_entity(mut self, name: impl Into<String>, def: EntityDef) -> Self {
        self.entities.insert(name.into(), def);
        self
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog document from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        tracing::debug!(path = %path.display(), "Loading schema catalog");
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(entities = catalog.entities.len(), "Schema catalog loaded");
        Ok(catalog)
    }
}

impl SchemaCatalog for StaticCatalog {
    fn relations(&self, entity: &str) -> Vec<RelationDef> {
        self.entities
            .get(entity)
            .map(|def| def.relations.clone())
            .unwrap_or_default()
    }

    fn table(&self, entity: &str) -> String {
        self.entities
            .get(entity)
            .and_then(|def| def.table.clone())
            .unwrap_or_else(|| to_snake_case(entity))
    }
}
