//! Compiles nested filter, order and pagination requests into parameterized
//! SQL against an entity and its relations.
//!
//! The entry point is [`generate_query`](data::query::generate_query), which
//! drives any [`QueryBuilder`](data::query::QueryBuilder). The bundled
//! [`SelectQuery`](data::query::SelectQuery) renders the result as SQL.

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
