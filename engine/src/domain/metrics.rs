//! Resolver call metrics
//!
//! Counts calls, successes and errors per resolver and records execution time
//! in a fixed-bucket histogram. [`track`] wraps a resolver body; the sink is
//! passed in explicitly and tracking is skipped when there is none.
//!
//! Series:
//! - `resolver_call_total{resolver, type}`
//! - `resolver_success_total{resolver, type}`
//! - `resolver_error_total{resolver, type}`
//! - `resolver_execution_duration_seconds{resolver, type, status}`

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

use super::response::ResolverResponse;

/// Histogram upper bounds in seconds
pub const DURATION_BUCKETS: [f64; 8] = [0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Query,
    Mutation,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome label on the duration histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

/// Receiver for resolver metrics
pub trait MetricsSink: Send + Sync {
    fn record_call(&self, resolver: &str, kind: ResolverKind);
    fn record_success(&self, resolver: &str, kind: ResolverKind);
    fn record_error(&self, resolver: &str, kind: ResolverKind);
    fn observe_duration(&self, resolver: &str, kind: ResolverKind, status: CallStatus, seconds: f64);
}

/// Resolver results that can report failure without being an `Err`
pub trait ResolverOutcome {
    fn is_failure(&self) -> bool {
        false
    }
}

impl ResolverOutcome for ResolverResponse {
    fn is_failure(&self) -> bool {
        self.is_error()
    }
}

impl ResolverOutcome for () {}

/// JSON results report failure through a `"status": "error"` field
impl ResolverOutcome for serde_json::Value {
    fn is_failure(&self) -> bool {
        self.get("status").and_then(serde_json::Value::as_str) == Some("error")
    }
}

/// Run a resolver body and record its metrics
///
/// An `Err`, or an `Ok` whose value reports failure, counts as an error.
/// Everything else counts as a success. The result is returned unchanged.
pub fn track<T, E, F>(
    sink: Option<&dyn MetricsSink>,
    resolver: &str,
    kind: ResolverKind,
    f: F,
) -> Result<T, E>
where
    T: ResolverOutcome,
    F: FnOnce() -> Result<T, E>,
{
    let Some(sink) = sink else {
        return f();
    };

    sink.record_call(resolver, kind);
    let start = Instant::now();
    let result = f();

    let status = match &result {
        Ok(value) if !value.is_failure() => CallStatus::Success,
        _ => CallStatus::Error,
    };
    match status {
        CallStatus::Success => sink.record_success(resolver, kind),
        CallStatus::Error => sink.record_error(resolver, kind),
    }

    let seconds = start.elapsed().as_secs_f64();
    sink.observe_duration(resolver, kind, status, seconds);
    tracing::trace!(resolver, %kind, status = status.as_str(), seconds, "Resolver tracked");
    result
}

/// Call, success and error counts for one resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallCounts {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
}

/// Cumulative bucket counts, sum and count of observed durations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationHistogram {
    /// Observations at or below each bound in [`DURATION_BUCKETS`]
    pub buckets: [u64; DURATION_BUCKETS.len()],
    pub count: u64,
    pub sum: f64,
}

impl Default for DurationHistogram {
    fn default() -> Self {
        Self {
            buckets: [0; DURATION_BUCKETS.len()],
            count: 0,
            sum: 0.0,
        }
    }
}

impl DurationHistogram {
    fn observe(&mut self, seconds: f64) {
        for (bucket, bound) in self.buckets.iter_mut().zip(DURATION_BUCKETS) {
            if seconds <= bound {
                *bucket += 1;
            }
        }
        self.count += 1;
        self.sum += seconds;
    }
}

/// Metrics for one resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolverSeries {
    pub resolver: String,
    #[serde(rename = "type")]
    pub kind: ResolverKind,
    #[serde(flatten)]
    pub counts: CallCounts,
    pub durations: BTreeMap<CallStatus, DurationHistogram>,
}

type SeriesKey = (String, ResolverKind);

#[derive(Default)]
struct MetricsState {
    counts: BTreeMap<SeriesKey, CallCounts>,
    durations: BTreeMap<SeriesKey, BTreeMap<CallStatus, DurationHistogram>>,
}

/// Thread-safe in-process [`MetricsSink`]
#[derive(Default)]
pub struct InMemoryMetrics {
    state: Mutex<MetricsState>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self, resolver: &str, kind: ResolverKind) -> CallCounts {
        self.state
            .lock()
            .counts
            .get(&(resolver.to_string(), kind))
            .copied()
            .unwrap_or_default()
    }

    /// Copy of every series, ordered by resolver then kind
    pub fn snapshot(&self) -> Vec<ResolverSeries> {
        let state = self.state.lock();
        state
            .counts
            .iter()
            .map(|((resolver, kind), counts)| ResolverSeries {
                resolver: resolver.clone(),
                kind: *kind,
                counts: *counts,
                durations: state
                    .durations
                    .get(&(resolver.clone(), *kind))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Prometheus text exposition of all series
    pub fn render_text(&self) -> String {
        let series = self.snapshot();
        let mut out = String::new();

        let counters: [(&str, &str, fn(&CallCounts) -> u64); 3] = [
            ("resolver_call_total", "Total number of resolver calls", |c| c.calls),
            ("resolver_success_total", "Total number of successful resolver calls", |c| c.successes),
            ("resolver_error_total", "Total number of resolver errors", |c| c.errors),
        ];
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP {} {}", name, help);
            let _ = writeln!(out, "# TYPE {} counter", name);
            for s in &series {
                let _ = writeln!(
                    out,
                    "{}{{resolver=\"{}\",type=\"{}\"}} {}",
                    name,
                    s.resolver,
                    s.kind,
                    value(&s.counts)
                );
            }
        }

        let name = "resolver_execution_duration_seconds";
        let _ = writeln!(out, "# HELP {} Duration of resolver execution in seconds", name);
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for s in &series {
            for (status, hist) in &s.durations {
                let labels = format!(
                    "resolver=\"{}\",type=\"{}\",status=\"{}\"",
                    s.resolver,
                    s.kind,
                    status.as_str()
                );
                for (bound, count) in DURATION_BUCKETS.iter().zip(hist.buckets) {
                    let _ = writeln!(out, "{}_bucket{{{},le=\"{}\"}} {}", name, labels, bound, count);
                }
                let _ = writeln!(out, "{}_bucket{{{},le=\"+Inf\"}} {}", name, labels, hist.count);
                let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, hist.sum);
                let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, hist.count);
            }
        }
        out
    }

    fn with_counts(&self, resolver: &str, kind: ResolverKind, f: impl FnOnce(&mut CallCounts)) {
        let mut state = self.state.lock();
        f(state.counts.entry((resolver.to_string(), kind)).or_default());
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_call(&self, resolver: &str, kind: ResolverKind) {
        self.with_counts(resolver, kind, |c| c.calls += 1);
    }

    fn record_success(&self, resolver: &str, kind: ResolverKind) {
        self.with_counts(resolver, kind, |c| c.successes += 1);
    }

    fn record_error(&self, resolver: &str, kind: ResolverKind) {
        self.with_counts(resolver, kind, |c| c.errors += 1);
    }

    fn observe_duration(&self, resolver: &str, kind: ResolverKind, status: CallStatus, seconds: f64) {
        self.state
            .lock()
            .durations
            .entry((resolver.to_string(), kind))
            .or_default()
            .entry(status)
            .or_default()
            .observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_success_is_counted() {
        let metrics = InMemoryMetrics::new();
        let result: Result<(), String> =
            track(Some(&metrics), "users", ResolverKind::Query, || Ok(()));

        assert!(result.is_ok());
        assert_eq!(
            metrics.counts("users", ResolverKind::Query),
            CallCounts {
                calls: 1,
                successes: 1,
                errors: 0
            }
        );
    }

    #[test]
    fn test_err_is_counted_and_returned() {
        let metrics = InMemoryMetrics::new();
        let result: Result<(), &str> =
            track(Some(&metrics), "users", ResolverKind::Query, || Err("boom"));

        assert_eq!(result, Err("boom"));
        let counts = metrics.counts("users", ResolverKind::Query);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.successes, 0);
    }

    #[test]
    fn test_error_response_counts_as_error() {
        let metrics = InMemoryMetrics::new();
        let result: Result<ResolverResponse, ()> =
            track(Some(&metrics), "createUser", ResolverKind::Mutation, || {
                Ok(ResolverResponse::error("duplicate"))
            });

        assert!(result.unwrap().is_error());
        assert_eq!(metrics.counts("createUser", ResolverKind::Mutation).errors, 1);

        let series = metrics.snapshot();
        assert_eq!(series.len(), 1);
        assert!(series[0].durations.contains_key(&CallStatus::Error));
        assert!(!series[0].durations.contains_key(&CallStatus::Success));
    }

    #[test]
    fn test_json_error_status_counts_as_error() {
        let metrics = InMemoryMetrics::new();
        let _: Result<serde_json::Value, ()> = track(Some(&metrics), "q", ResolverKind::Query, || {
            Ok(serde_json::json!({"status": "error", "message": "nope"}))
        });
        let _: Result<serde_json::Value, ()> = track(Some(&metrics), "q", ResolverKind::Query, || {
            Ok(serde_json::json!({"sql": "SELECT 1"}))
        });

        let counts = metrics.counts("q", ResolverKind::Query);
        assert_eq!(counts.calls, 2);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.successes, 1);
    }

    #[test]
    fn test_without_sink_runs_body_only() {
        let mut ran = false;
        let result: Result<(), ()> = track(None, "users", ResolverKind::Query, || {
            ran = true;
            Ok(())
        });
        assert!(result.is_ok());
        assert!(ran);
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let mut hist = DurationHistogram::default();
        hist.observe(0.003);
        hist.observe(0.2);
        hist.observe(10.0);

        assert_eq!(hist.buckets, [1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(hist.count, 3);
        assert!((hist.sum - 10.203).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_tracking() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let _: Result<(), ()> =
                            track(Some(&*metrics), "users", ResolverKind::Query, || Ok(()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.counts("users", ResolverKind::Query).calls, 100);
    }

    #[test]
    fn test_render_text_exposition() {
        let metrics = InMemoryMetrics::new();
        let _: Result<(), ()> = track(Some(&metrics), "users", ResolverKind::Query, || Ok(()));

        let text = metrics.render_text();
        assert!(text.contains("resolver_call_total{resolver=\"users\",type=\"query\"} 1"));
        assert!(text.contains("resolver_error_total{resolver=\"users\",type=\"query\"} 0"));
        assert!(text.contains(
            "resolver_execution_duration_seconds_count{resolver=\"users\",type=\"query\",status=\"SUCCESS\"} 1"
        ));
        assert!(text.contains("# TYPE resolver_execution_duration_seconds histogram"));
    }
}
