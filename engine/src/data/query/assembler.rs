//! Query assembly
//!
//! Drives a [`QueryBuilder`] through the full compilation: relation graph,
//! joins, WHERE clause, ordering and paging. Nothing is executed.

use crate::data::error::QueryError;
use crate::data::filters::{BuildResult, ParamIndex, build_where_clause, join_relations};
use crate::data::order::apply_order;
use crate::data::request::QueryRequest;
use crate::data::schema::{RelationMap, SchemaCatalog, resolve_relations};

use super::builder::QueryBuilder;

/// Root entity of a query and the catalog that describes it
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    pub catalog: &'a dyn SchemaCatalog,
    pub name: &'a str,
}

impl<'a> EntityRef<'a> {
    pub fn new(catalog: &'a dyn SchemaCatalog, name: &'a str) -> Self {
        Self { catalog, name }
    }
}

/// Apply `request` to `query`, with `alias` naming the root entity
///
/// Fails only when no query builder is supplied, before any other input is
/// looked at. Without an entity every key is treated as a column. The filter
/// predicate replaces whatever predicate the builder already had. Each call
/// uses its own relation map and parameter counter.
pub fn generate_query<'q, Q>(
    query: Option<&'q mut Q>,
    alias: &str,
    request: &QueryRequest,
    entity: Option<EntityRef<'_>>,
) -> Result<&'q mut Q, QueryError>
where
    Q: QueryBuilder + ?Sized,
{
    let Some(query) = query else {
        return Err(QueryError::MissingQueryBuilder);
    };

    let relations = match entity {
        Some(entity) => resolve_relations(entity.catalog, entity.name),
        None => RelationMap::new(),
    };
    tracing::debug!(
        alias,
        entity = entity.map(|e| e.name),
        relations = relations.len(),
        "Generating query"
    );

    if let Some(filter) = &request.filter {
        let joins = join_relations(query, alias, filter, &relations);
        let mut params = ParamIndex::new();
        let BuildResult { clause, parameters } =
            build_where_clause(filter, alias, &relations, &mut params);
        tracing::debug!(
            joins,
            params = params.issued(),
            clause = %clause,
            "Compiled filter"
        );
        query.set_where(clause, parameters);
    }

    if let Some(order) = &request.order {
        apply_order(query, order, alias, &relations);
    }

    if let Some(pagination) = &request.pagination {
        let window = pagination.window();
        tracing::trace!(offset = window.offset, limit = window.limit, "Applying pagination");
        query.skip(window.offset);
        query.take(window.limit);
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::data::filters::FilterNode;
    use crate::data::order::OrderSpec;
    use crate::data::pagination::Pagination;
    use crate::data::query::recording::{Call, RecordingBuilder};
    use crate::data::schema::{RelationDef, StaticCatalog};

    /// Catalog that counts lookups
    struct CountingCatalog {
        inner: StaticCatalog,
        lookups: Cell<usize>,
    }

    impl SchemaCatalog for CountingCatalog {
        fn relations(&self, entity: &str) -> Vec<RelationDef> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.relations(entity)
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_json(
            r#"{"entities": {
                "Post": {"relations": [{"property": "author", "target": "User"}]},
                "User": {"relations": [{"property": "posts", "target": "Post", "kind": "one_to_many"}]}
            }}"#,
        )
        .unwrap()
    }

    fn request(value: serde_json::Value) -> QueryRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_builder_fails_before_resolving() {
        let counting = CountingCatalog {
            inner: catalog(),
            lookups: Cell::new(0),
        };
        let req = request(json!({"where": {"author": {"name": "a"}}}));

        let result = generate_query::<RecordingBuilder>(
            None,
            "post",
            &req,
            Some(EntityRef::new(&counting, "Post")),
        );

        assert!(matches!(result, Err(QueryError::MissingQueryBuilder)));
        assert_eq!(counting.lookups.get(), 0);
    }

    #[test]
    fn test_joins_registered_before_where() {
        let catalog = catalog();
        let mut query = RecordingBuilder::default();
        let req = request(json!({"where": {"title": "x", "author": {"name": "a"}}}));

        generate_query(
            Some(&mut query),
            "post",
            &req,
            Some(EntityRef::new(&catalog, "Post")),
        )
        .unwrap();

        assert_eq!(query.calls.len(), 2);
        assert_eq!(
            query.calls[0],
            Call::Join {
                path: "post.author".into(),
                alias: "author".into()
            }
        );
        match &query.calls[1] {
            Call::Where { clause, parameters } => {
                assert_eq!(clause, "post.title = :param0 AND (author.name = :param1)");
                assert_eq!(parameters["param0"], json!("x"));
                assert_eq!(parameters["param1"], json!("a"));
            }
            other => panic!("expected where, got {:?}", other),
        }
    }

    #[test]
    fn test_full_request_call_order() {
        let catalog = catalog();
        let mut query = RecordingBuilder::default();
        let req = QueryRequest::default()
            .with_filter(FilterNode::from_json(&json!({"id": {"gt": 1}})))
            .with_order(serde_json::from_value::<OrderSpec>(json!({"author": {"name": "ASC"}})).unwrap())
            .with_pagination(Pagination::new(2, 10));

        generate_query(
            Some(&mut query),
            "post",
            &req,
            Some(EntityRef::new(&catalog, "Post")),
        )
        .unwrap();

        assert!(matches!(query.calls[0], Call::Where { .. }));
        assert_eq!(
            query.calls[1],
            Call::OrderBy {
                column: "author.name".into(),
                direction: "ASC".into()
            }
        );
        assert_eq!(query.calls[2], Call::Skip(10));
        assert_eq!(query.calls[3], Call::Take(10));
    }

    #[test]
    fn test_without_entity_relations_are_columns() {
        let mut query = RecordingBuilder::default();
        let req = request(json!({"where": {"author": {"eq": 5}}}));

        generate_query(Some(&mut query), "post", &req, None).unwrap();

        assert!(query.joins().is_empty());
        assert!(matches!(
            &query.calls[0],
            Call::Where { clause, .. } if clause == "post.author = :param0"
        ));
    }

    #[test]
    fn test_empty_request_touches_nothing() {
        let mut query = RecordingBuilder::default();
        generate_query(Some(&mut query), "post", &QueryRequest::default(), None).unwrap();
        assert!(query.calls.is_empty());
    }

    #[test]
    fn test_each_call_restarts_numbering() {
        let catalog = catalog();
        let req = request(json!({"where": {"or": [{"a": 1}, {"b": 2}]}}));

        let mut first = RecordingBuilder::default();
        let mut second = RecordingBuilder::default();
        generate_query(Some(&mut first), "post", &req, Some(EntityRef::new(&catalog, "Post")))
            .unwrap();
        generate_query(Some(&mut second), "post", &req, Some(EntityRef::new(&catalog, "Post")))
            .unwrap();

        assert_eq!(first.calls, second.calls);
    }

    #[test]
    fn test_returns_same_builder() {
        let mut query = RecordingBuilder::default();
        let req = request(json!({"pagination": {"page": 1, "count": 5}}));

        let returned = generate_query(Some(&mut query), "t", &req, None).unwrap();
        returned.take(99);

        assert_eq!(query.calls, vec![Call::Skip(0), Call::Take(5), Call::Take(99)]);
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut recording = RecordingBuilder::default();
        let query: &mut dyn QueryBuilder = &mut recording;
        let req = request(json!({"where": {"a": 1}}));

        generate_query(Some(query), "t", &req, None).unwrap();
        assert_eq!(recording.calls.len(), 1);
    }
}
