//! In-process router evaluation.
//!
//! Runs the router plugins described by a [`RouterInvocationRequest`] without
//! a remote routing engine:
//! * metadata router: keeps instances whose metadata contains every label
//! * nearby router: keeps same-zone instances, degrading to same-region and
//!   then to the full set, so it never empties a non-empty candidate set
//! * rule-based router: rule matching is left to the routing engine, so here
//!   it passes the candidates through unchanged
use crate::{
    core::{
        identity::{Location, REGION_METADATA_KEY, ZONE_METADATA_KEY},
        instance::{ServiceInstanceRecord, ServiceInstanceSnapshot},
        label_codec::Labels,
        router_chain::{
            ROUTER_ENABLED_KEY, RouterInvocationRequest, RouterInvocationResult, RouterKind,
        },
    },
    ports::router_evaluator::{EvaluationResult, RouterEvaluator},
};

/// Evaluates the router chain locally
#[derive(Debug, Clone, Default)]
pub struct LocalRouterEvaluator {
    location: Option<Location>,
}

impl LocalRouterEvaluator {
    /// Create an evaluator for a caller at `location`
    pub fn new(location: Option<Location>) -> Self {
        Self { location }
    }

    fn metadata_route(
        &self,
        snapshot: ServiceInstanceSnapshot,
        labels: &Labels,
    ) -> ServiceInstanceSnapshot {
        if labels.is_empty() {
            return snapshot;
        }
        snapshot.retain(|instance| metadata_matches(instance, labels))
    }

    fn nearby_route(&self, snapshot: ServiceInstanceSnapshot) -> ServiceInstanceSnapshot {
        let Some(location) = &self.location else {
            tracing::debug!("Nearby router enabled without a local location, skipping");
            return snapshot;
        };

        let same_zone = snapshot.retain(|instance| {
            same_value(instance, REGION_METADATA_KEY, &location.region)
                && same_value(instance, ZONE_METADATA_KEY, &location.zone)
        });
        if !same_zone.is_empty() {
            return same_zone;
        }

        let same_region =
            snapshot.retain(|instance| same_value(instance, REGION_METADATA_KEY, &location.region));
        if !same_region.is_empty() {
            tracing::debug!(
                zone = %location.zone,
                "No instance in local zone, degrading to region"
            );
            return same_region;
        }

        tracing::debug!(region = %location.region, "No instance in local region, keeping all");
        snapshot
    }
}

fn metadata_matches(instance: &ServiceInstanceRecord, labels: &Labels) -> bool {
    labels
        .iter()
        .all(|(key, value)| instance.metadata.get(key) == Some(value))
}

fn same_value(instance: &ServiceInstanceRecord, key: &str, expected: &str) -> bool {
    instance.metadata.get(key).map(String::as_str) == Some(expected)
}

fn switched_on(request: &RouterInvocationRequest, kind: RouterKind) -> bool {
    request
        .router_metadata(kind)
        .and_then(|entry| entry.get(ROUTER_ENABLED_KEY))
        .is_some_and(|value| value == "true")
}

impl RouterEvaluator for LocalRouterEvaluator {
    fn evaluate(
        &self,
        request: &RouterInvocationRequest,
    ) -> EvaluationResult<RouterInvocationResult> {
        let mut snapshot = request.target.clone();

        if let Some(labels) = request.router_metadata(RouterKind::Metadata) {
            snapshot = self.metadata_route(snapshot, labels);
            tracing::trace!(remaining = snapshot.len(), "Metadata router applied");
        }

        if switched_on(request, RouterKind::Nearby) {
            snapshot = self.nearby_route(snapshot);
            tracing::trace!(remaining = snapshot.len(), "Nearby router applied");
        }

        if switched_on(request, RouterKind::RuleBased) {
            tracing::trace!(
                source = %request.source.service,
                labels = ?request.source.metadata,
                "Rule-based router has no local rules, passing through"
            );
        }

        Ok(RouterInvocationResult { filtered: snapshot })
    }
}
