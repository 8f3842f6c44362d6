//! Routing pipeline: the single entry point used by the load-balancing layer.
//!
//! For each call the pipeline builds the routing context from the inbound
//! headers, adapts the discovered instances into a snapshot, runs the router
//! chain and hands back the surviving instances. Every value it builds is
//! call-scoped, so one pipeline can serve concurrent calls without locking.
use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

use crate::{
    core::{
        context::RoutingContext,
        identity::LocalIdentity,
        instance::{ServiceInstanceRecord, ServiceInstanceSnapshot},
        label_codec::{LabelDecodeError, Labels},
        router_chain::{RouterChain, RouterFlags},
    },
    metrics::{self, RouteOutcome, RouteTimer},
    ports::router_evaluator::{EvaluationError, RouterEvaluator},
};

/// Default name of the routing-label header
pub const DEFAULT_LABEL_HEADER: &str = "X-Router-Label";

/// Errors surfaced by [`RoutingPipeline::route`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoutingError {
    /// A routing-label header value could not be decoded
    #[error("Invalid routing label header: {0}")]
    HeaderDecode(#[from] LabelDecodeError),

    /// The pipeline was called without a request to route for
    #[error("Routing requires a request context; the caller did not supply one")]
    MissingContext,

    /// The router evaluator failed
    #[error("Router evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
}

impl RoutingError {
    fn outcome(&self) -> RouteOutcome {
        match self {
            RoutingError::HeaderDecode(_) => RouteOutcome::HeaderDecodeError,
            RoutingError::MissingContext => RouteOutcome::MissingContext,
            RoutingError::Evaluation(_) => RouteOutcome::EvaluationError,
        }
    }
}

/// Result type for routing calls
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Request-scoped inputs of a routing call.
///
/// `transitive` carries the labels propagated along the call chain by the
/// surrounding framework; they are passed in explicitly rather than read from
/// request-local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub headers: HashMap<String, Vec<String>>,
    pub transitive: Labels,
}

impl InboundRequest {
    pub fn new(headers: HashMap<String, Vec<String>>) -> Self {
        Self {
            headers,
            transitive: Labels::new(),
        }
    }

    /// Append a header value
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Set the propagated labels
    pub fn with_transitive(mut self, transitive: Labels) -> Self {
        self.transitive = transitive;
        self
    }
}

/// Composition root of the routing core.
pub struct RoutingPipeline {
    chain: RouterChain,
    label_header: String,
}

impl RoutingPipeline {
    pub fn new(
        identity: LocalIdentity,
        flags: RouterFlags,
        label_header: impl Into<String>,
        evaluator: Arc<dyn RouterEvaluator>,
    ) -> Self {
        Self {
            chain: RouterChain::new(identity, flags, evaluator),
            label_header: label_header.into(),
        }
    }

    pub fn chain(&self) -> &RouterChain {
        &self.chain
    }

    pub fn label_header(&self) -> &str {
        &self.label_header
    }

    /// Route `instances` for `request` and return the eligible ones.
    ///
    /// `request` must be present: a call without one is a wiring defect and
    /// fails with [`RoutingError::MissingContext`] instead of silently routing
    /// to every instance. An empty result is returned as-is.
    pub fn route<I>(
        &self,
        instances: I,
        request: Option<&InboundRequest>,
    ) -> RoutingResult<Vec<ServiceInstanceRecord>>
    where
        I: IntoIterator<Item = ServiceInstanceRecord>,
    {
        let _timer = RouteTimer::new();
        let result = self.route_inner(instances, request);
        match &result {
            Ok(routed) if routed.is_empty() => metrics::increment_route_calls(RouteOutcome::Empty),
            Ok(_) => metrics::increment_route_calls(RouteOutcome::Routed),
            Err(e) => {
                tracing::warn!(error = %e, "Routing call failed");
                metrics::increment_route_calls(e.outcome());
            }
        }
        result
    }

    fn route_inner<I>(
        &self,
        instances: I,
        request: Option<&InboundRequest>,
    ) -> RoutingResult<Vec<ServiceInstanceRecord>>
    where
        I: IntoIterator<Item = ServiceInstanceRecord>,
    {
        let request = request.ok_or(RoutingError::MissingContext)?;

        let context =
            RoutingContext::from_headers(&request.headers, &self.label_header, &request.transitive)?;

        let identity = self.chain.identity();
        let snapshot = ServiceInstanceSnapshot::adapt(instances, &identity.namespace);
        let candidates = snapshot.len();

        let flags = self.chain.flags();
        let invocation = self.chain.build_request(snapshot, context.as_ref(), &flags);
        tracing::debug!(
            target_service = %invocation.target.service_key(),
            candidates,
            has_context = context.is_some(),
            routers = ?invocation.router_metadata.keys().collect::<Vec<_>>(),
            "Invoking router chain"
        );

        let result = self.chain.invoke(&invocation)?;
        metrics::record_instance_counts(candidates, result.filtered.len());
        tracing::debug!(
            candidates,
            remaining = result.filtered.len(),
            "Router chain finished"
        );

        Ok(result.filtered.into_records())
    }
}
