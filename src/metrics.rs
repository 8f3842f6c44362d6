//! Lightweight metrics helpers for the routing layer.
//!
//! This module wraps the `metrics` crate macros and describes the metric
//! names used by the pipeline. No exporter is installed here; the embedding
//! application can initialize any compatible recorder.
//!
//! Provided metrics:
//! * `mesh_router_route_calls_total` (counter, label `outcome`)
//! * `mesh_router_route_duration_seconds` (histogram)
//! * `mesh_router_candidate_instances` (histogram)
//! * `mesh_router_filtered_instances` (histogram)
//!
//! [`RouteTimer`] records the call duration on `Drop`, including early returns.
use std::time::Instant;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const MESH_ROUTER_ROUTE_CALLS_TOTAL: &str = "mesh_router_route_calls_total";
pub const MESH_ROUTER_ROUTE_DURATION_SECONDS: &str = "mesh_router_route_duration_seconds";
pub const MESH_ROUTER_CANDIDATE_INSTANCES: &str = "mesh_router_candidate_instances";
pub const MESH_ROUTER_FILTERED_INSTANCES: &str = "mesh_router_filtered_instances";

static DESCRIPTIONS: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        MESH_ROUTER_ROUTE_CALLS_TOTAL,
        Unit::Count,
        "Total number of routing calls, by outcome."
    );
    describe_histogram!(
        MESH_ROUTER_ROUTE_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of routing calls including router evaluation."
    );
    describe_histogram!(
        MESH_ROUTER_CANDIDATE_INSTANCES,
        Unit::Count,
        "Number of instances handed to the router chain."
    );
    describe_histogram!(
        MESH_ROUTER_FILTERED_INSTANCES,
        Unit::Count,
        "Number of instances left after router evaluation."
    );
});

/// Outcome label values for `mesh_router_route_calls_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Routed,
    Empty,
    HeaderDecodeError,
    MissingContext,
    EvaluationError,
}

impl RouteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOutcome::Routed => "routed",
            RouteOutcome::Empty => "empty",
            RouteOutcome::HeaderDecodeError => "header_decode_error",
            RouteOutcome::MissingContext => "missing_context",
            RouteOutcome::EvaluationError => "evaluation_error",
        }
    }
}

/// Count a finished routing call.
pub fn increment_route_calls(outcome: RouteOutcome) {
    counter!(MESH_ROUTER_ROUTE_CALLS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Record how many instances entered and left the router chain.
pub fn record_instance_counts(candidates: usize, filtered: usize) {
    histogram!(MESH_ROUTER_CANDIDATE_INSTANCES).record(candidates as f64);
    histogram!(MESH_ROUTER_FILTERED_INSTANCES).record(filtered as f64);
}

/// RAII helper measuring routing call duration.
pub struct RouteTimer {
    start: Instant,
}

impl Default for RouteTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for RouteTimer {
    fn drop(&mut self) {
        histogram!(MESH_ROUTER_ROUTE_DURATION_SECONDS).record(self.start.elapsed().as_secs_f64());
    }
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing mesh-router metrics");
    Lazy::force(&DESCRIPTIONS);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_timer() {
        let timer = RouteTimer::new();
        // Timer will record duration when dropped
        drop(timer);
    }

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RouteOutcome::Routed.as_str(), "routed");
        assert_eq!(RouteOutcome::MissingContext.as_str(), "missing_context");
        increment_route_calls(RouteOutcome::Empty);
        record_instance_counts(3, 0);
    }
}
