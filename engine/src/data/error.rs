//! Error types for the query layer
//!
//! Compilation itself never fails: malformed filter fragments degrade to
//! "no contribution". The only compile-time error is a usage error raised by
//! the assembler; rendering a [`SelectQuery`](crate::data::query::SelectQuery)
//! can additionally fail on joins the catalog cannot resolve. Catalog loading
//! and request parsing have their own errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling a query
#[derive(Error, Debug)]
pub enum QueryError {
    /// No query builder was handed to the assembler
    #[error("A query builder is required to generate a query")]
    MissingQueryBuilder,

    /// A registered join has no matching relation in the catalog
    #[error("Join {path} does not match any catalog relation")]
    UnresolvedJoin { path: String },
}

/// Errors raised while loading a schema catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read schema catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog document is not valid
    #[error("Failed to parse schema catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while parsing a filter request
#[derive(Error, Debug)]
pub enum RequestError {
    /// Request document exceeds the size limit
    #[error("Request JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    /// Request document is not valid JSON or has the wrong shape
    #[error("Invalid request JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Filter or order tree nests deeper than allowed
    #[error("{section} nesting exceeds maximum depth of {max}")]
    TooDeep { section: &'static str, max: usize },

    /// Pagination bounds violated
    #[error("Invalid pagination: {0}")]
    InvalidPagination(#[from] validator::ValidationErrors),
}

impl CatalogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl RequestError {
    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "REQUEST_JSON_TOO_LARGE",
            Self::InvalidJson(_) => "INVALID_REQUEST_JSON",
            Self::TooDeep { .. } => "REQUEST_TOO_DEEP",
            Self::InvalidPagination(_) => "INVALID_PAGINATION",
        }
    }
}
