//! Filter tree compilation
//!
//! Turns a nested filter description into a parameterized WHERE clause and
//! plans the relation joins the clause depends on.
//!
//! ## Usage
//!
//! ```
//! use pgfilter::data::filters::{FilterNode, ParamIndex, build_where_clause};
//! use pgfilter::data::schema::RelationMap;
//!
//! let node: FilterNode = serde_json::from_str(r#"{"age": {"between": [18, 30]}}"#).unwrap();
//! let mut params = ParamIndex::new();
//! let res = build_where_clause(&node, "user", &RelationMap::new(), &mut params);
//! assert_eq!(res.clause, "user.age BETWEEN :param0 AND :param1");
//! ```

mod builder;
mod joins;
mod operators;
mod types;

pub use builder::{BuildResult, ParamIndex, Parameters, build_where_clause};
pub use joins::join_relations;
pub use operators::{Arity, Operator};
pub use types::{FilterNode, FilterValue, LogicalOp};
