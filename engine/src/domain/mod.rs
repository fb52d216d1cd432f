//! Resolver-facing types: base response and call metrics

pub mod metrics;
pub mod response;

pub use metrics::{InMemoryMetrics, MetricsSink, ResolverKind, ResolverOutcome, track};
pub use response::{ResolverResponse, ResponseStatus};
