//! Query assembly and rendering

mod assembler;
mod builder;
mod select;

pub use assembler::{EntityRef, generate_query};
pub use builder::QueryBuilder;
pub use select::{PositionalQuery, SelectQuery};

#[cfg(test)]
pub(crate) use builder::recording;
