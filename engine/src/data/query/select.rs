//! Renderable SELECT query
//!
//! [`SelectQuery`] is the crate's own [`QueryBuilder`]: it records joins,
//! predicate, ordering and paging, resolves joins through the schema catalog
//! and renders SQL with either named or positional placeholders.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use crate::data::error::QueryError;
use crate::data::filters::Parameters;
use crate::data::schema::SchemaCatalog;
use crate::data::sql::SqlDialect;

use super::builder::QueryBuilder;

/// Named placeholder: `:param3` or the list form `:...param3`
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(\.\.\.)?([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder regex is valid")
});

/// Row source for an empty `:...name` list
const EMPTY_LIST: &str = "SELECT NULL WHERE 1=0";

#[derive(Debug, Clone)]
struct JoinClause {
    path: String,
    alias: String,
    /// Target table and ON condition, when the catalog knows the relation
    resolved: Option<(String, String)>,
}

/// Query rendered with positional placeholders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalQuery {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// SELECT over a root entity and its joined relations
pub struct SelectQuery<'a> {
    catalog: &'a dyn SchemaCatalog,
    root_alias: String,
    root_table: String,
    /// alias → entity, for resolving nested joins
    entities: HashMap<String, String>,
    joins: Vec<JoinClause>,
    clause: String,
    parameters: Parameters,
    order: Vec<(String, String)>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl<'a> SelectQuery<'a> {
    pub fn new(catalog: &'a dyn SchemaCatalog, entity: &str, alias: &str) -> Self {
        let mut entities = HashMap::new();
        entities.insert(alias.to_string(), entity.to_string());
        Self {
            catalog,
            root_alias: alias.to_string(),
            root_table: catalog.table(entity),
            entities,
            joins: Vec::new(),
            clause: String::new(),
            parameters: Parameters::new(),
            order: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// Current predicate and its parameters
    pub fn predicate(&self) -> (&str, &Parameters) {
        (&self.clause, &self.parameters)
    }

    /// Registered joins as (path, alias)
    pub fn joins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.joins
            .iter()
            .map(|j| (j.path.as_str(), j.alias.as_str()))
    }

    /// Render with named placeholders (`:param0`, `:...param1`)
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> Result<String, QueryError> {
        let mut sql = format!(
            "SELECT {alias}.* FROM {table} {alias}",
            alias = self.root_alias,
            table = self.root_table
        );

        for join in &self.joins {
            let Some((table, on)) = &join.resolved else {
                return Err(QueryError::UnresolvedJoin {
                    path: join.path.clone(),
                });
            };
            sql.push_str(&format!(" INNER JOIN {} {} ON {}", table, join.alias, on));
        }

        if !self.clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clause);
        }

        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|(column, dir)| format!("{} {}", column, dir))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(paging) = dialect.limit_offset(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&paging);
        }

        Ok(sql)
    }

    /// Render with the dialect's positional placeholders
    ///
    /// `:...name` bound to an array expands to one placeholder per element;
    /// an empty array renders as a subquery with no rows, so `IN` matches
    /// nothing and `NOT IN` matches everything.
    /// Placeholders without a parameter are left untouched.
    pub fn to_positional(&self, dialect: &dyn SqlDialect) -> Result<PositionalQuery, QueryError> {
        let named = self.to_sql(dialect)?;
        let mut binds = Vec::new();

        let sql = PLACEHOLDER_RE.replace_all(&named, |caps: &Captures| {
            let spread = caps.get(1).is_some();
            let name = &caps[2];
            let Some(value) = self.parameters.get(name) else {
                return caps[0].to_string();
            };

            match value {
                Value::Array(items) if spread => {
                    if items.is_empty() {
                        return EMPTY_LIST.to_string();
                    }
                    items
                        .iter()
                        .map(|item| {
                            binds.push(item.clone());
                            dialect.placeholder(binds.len())
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                }
                other => {
                    binds.push(other.clone());
                    dialect.placeholder(binds.len())
                }
            }
        });

        Ok(PositionalQuery {
            sql: sql.into_owned(),
            binds,
        })
    }
}

impl QueryBuilder for SelectQuery<'_> {
    fn inner_join(&mut self, path: &str, alias: &str) {
        let resolved = path.split_once('.').and_then(|(parent, property)| {
            let owner = self.entities.get(parent)?.clone();
            let relation = self
                .catalog
                .relations(&owner)
                .into_iter()
                .find(|r| r.property == property)?;
            let on = format!(
                "{}.{} = {}.{}",
                alias,
                relation.foreign_column(&owner),
                parent,
                relation.local_column()
            );
            self.entities
                .insert(alias.to_string(), relation.target.clone());
            Some((self.catalog.table(&relation.target), on))
        });

        if resolved.is_none() {
            tracing::warn!(path, alias, "Join does not match a catalog relation");
        }

        self.joins.push(JoinClause {
            path: path.to_string(),
            alias: alias.to_string(),
            resolved,
        });
    }

    fn set_where(&mut self, clause: String, parameters: Parameters) {
        self.clause = clause;
        self.parameters = parameters;
    }

    fn add_order_by(&mut self, column: String, direction: &str) {
        self.order.push((column, direction.to_string()));
    }

    fn skip(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    fn take(&mut self, limit: u64) {
        self.limit = Some(limit);
    }
}
