pub mod error;
pub mod filters;
pub mod order;
pub mod pagination;
pub mod query;
pub mod request;
pub mod schema;
pub mod sql;
