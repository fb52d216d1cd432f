//! Query builder collaborator
//!
//! The compiler never owns a query. It drives whatever builder the caller
//! supplies through this trait and leaves execution to the caller.

use crate::data::filters::Parameters;

/// Operations the compiler needs from a query under construction
pub trait QueryBuilder {
    /// Register an inner join of `path` (`parent_alias.property`) as `alias`
    fn inner_join(&mut self, path: &str, alias: &str);

    /// Set the filter predicate, replacing any previous one
    fn set_where(&mut self, clause: String, parameters: Parameters);

    /// Append an ordering term
    fn add_order_by(&mut self, column: String, direction: &str);

    /// Number of rows to skip
    fn skip(&mut self, offset: u64);

    /// Maximum number of rows to return
    fn take(&mut self, limit: u64);
}
