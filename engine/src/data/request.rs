//! Filter request parsing
//!
//! Parses a JSON request into a [`QueryRequest`] and enforces the input
//! limits: document size, nesting depth and pagination bounds.

use serde::Deserialize;
use validator::Validate;

use crate::data::error::RequestError;
use crate::data::filters::FilterNode;
use crate::data::order::OrderSpec;
use crate::data::pagination::Pagination;

/// Maximum size of request JSON in bytes (64KB)
pub const MAX_REQUEST_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting depth of the filter and order trees
pub const MAX_NESTING_DEPTH: usize = 32;

/// Filter, order and pagination for one query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    #[serde(rename = "where", default)]
    pub filter: Option<FilterNode>,
    #[serde(default)]
    pub order: Option<OrderSpec>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl QueryRequest {
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Check depth and pagination limits
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(filter) = &self.filter
            && filter.depth() > MAX_NESTING_DEPTH
        {
            return Err(RequestError::TooDeep {
                section: "where",
                max: MAX_NESTING_DEPTH,
            });
        }
        if let Some(order) = &self.order
            && order.depth() > MAX_NESTING_DEPTH
        {
            return Err(RequestError::TooDeep {
                section: "order",
                max: MAX_NESTING_DEPTH,
            });
        }
        if let Some(pagination) = &self.pagination {
            pagination.validate()?;
        }
        Ok(())
    }
}

/// Parse a request from JSON
///
/// Validates JSON size, parses the request and checks nesting and pagination.
pub fn parse_request(json_str: &str) -> Result<QueryRequest, RequestError> {
    if json_str.len() > MAX_REQUEST_JSON_SIZE {
        return Err(RequestError::TooLarge {
            max: MAX_REQUEST_JSON_SIZE,
        });
    }

    let request: QueryRequest = serde_json::from_str(json_str)?;
    request.validate()?;

    tracing::trace!(
        has_filter = request.filter.is_some(),
        has_order = request.order.is_some(),
        has_pagination = request.pagination.is_some(),
        "Parsed filter request"
    );
    Ok(request)
}
