//! Router chain: builds the per-call router request and drives evaluation.
//!
//! The router set is closed. Each [`RouterKind`] knows what it contributes to
//! the router metadata bag; [`RouterChain::build_request`] visits them in the
//! fixed order of [`RouterKind::ALL`] so the bag content is deterministic for a
//! given snapshot, context and set of flags.
use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        context::{LabelSet, RoutingContext, labels_of},
        identity::LocalIdentity,
        instance::ServiceInstanceSnapshot,
        label_codec::Labels,
    },
    ports::router_evaluator::{EvaluationResult, RouterEvaluator},
};

/// Metadata key a router reads its enable switch from
pub const ROUTER_ENABLED_KEY: &str = "enabled";

/// The router plugins known to the chain, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RouterKind {
    /// Keeps instances whose metadata is a superset of the transitive labels
    #[serde(rename = "metadataRouter")]
    Metadata,
    /// Prefers instances in the caller's zone or region
    #[serde(rename = "nearbyBasedRouter")]
    Nearby,
    /// Evaluates externally defined rules against source-service attributes
    #[serde(rename = "ruleBasedRouter")]
    RuleBased,
}

impl RouterKind {
    pub const ALL: [RouterKind; 3] = [RouterKind::Metadata, RouterKind::Nearby, RouterKind::RuleBased];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouterKind::Metadata => "metadataRouter",
            RouterKind::Nearby => "nearbyBasedRouter",
            RouterKind::RuleBased => "ruleBasedRouter",
        }
    }

    /// Whether this router is switched on in `flags`
    pub fn is_enabled(&self, flags: &RouterFlags) -> bool {
        match self {
            RouterKind::Metadata => flags.metadata,
            RouterKind::Nearby => flags.nearby,
            RouterKind::RuleBased => flags.rule_based,
        }
    }

    /// Entry this router places in the metadata bag, if any.
    ///
    /// The rule-based router always reports its switch, even when disabled,
    /// since the evaluator may have its own enablement logic.
    pub fn metadata_contribution(
        &self,
        enabled: bool,
        context: Option<&RoutingContext>,
    ) -> Option<Labels> {
        match self {
            RouterKind::Metadata if enabled => Some(labels_of(context, LabelSet::Transitive)),
            RouterKind::Nearby if enabled => Some(enabled_flag(true)),
            RouterKind::RuleBased => Some(enabled_flag(enabled)),
            _ => None,
        }
    }

    /// Labels this router attaches to the source-service descriptor.
    pub fn source_contribution(
        &self,
        enabled: bool,
        context: Option<&RoutingContext>,
    ) -> Option<Labels> {
        match self {
            RouterKind::RuleBased if enabled => Some(labels_of(context, LabelSet::RuleRouter)),
            _ => None,
        }
    }
}

impl fmt::Display for RouterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown router type: {s}"))
    }
}

fn enabled_flag(enabled: bool) -> Labels {
    Labels::from([(ROUTER_ENABLED_KEY.to_string(), enabled.to_string())])
}

/// Caller-side enable switches for each router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterFlags {
    pub metadata: bool,
    pub nearby: bool,
    pub rule_based: bool,
}

impl Default for RouterFlags {
    fn default() -> Self {
        Self {
            metadata: true,
            nearby: false,
            rule_based: true,
        }
    }
}

/// Per-router configuration and state for one call, keyed by router type
pub type RouterMetadataBag = BTreeMap<RouterKind, Labels>;

/// The calling service, as seen by the routers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceService {
    pub namespace: String,
    pub service: String,
    pub metadata: Labels,
}

/// Everything the evaluator needs for one routing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterInvocationRequest {
    pub target: ServiceInstanceSnapshot,
    pub source: SourceService,
    pub router_metadata: RouterMetadataBag,
}

impl RouterInvocationRequest {
    /// Metadata bag entry for `kind`, if the router contributed one
    pub fn router_metadata(&self, kind: RouterKind) -> Option<&Labels> {
        self.router_metadata.get(&kind)
    }
}

/// Outcome of a router evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterInvocationResult {
    pub filtered: ServiceInstanceSnapshot,
}

/// Ordered chain of router plugins in front of a [`RouterEvaluator`].
///
/// Flags live in an [`ArcSwap`] so a configuration refresh can replace them
/// while calls are in flight; every call works on the flags it loaded.
pub struct RouterChain {
    identity: LocalIdentity,
    flags: ArcSwap<RouterFlags>,
    evaluator: Arc<dyn RouterEvaluator>,
}

impl RouterChain {
    pub fn new(
        identity: LocalIdentity,
        flags: RouterFlags,
        evaluator: Arc<dyn RouterEvaluator>,
    ) -> Self {
        Self {
            identity,
            flags: ArcSwap::from_pointee(flags),
            evaluator,
        }
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// Current router switches
    pub fn flags(&self) -> RouterFlags {
        **self.flags.load()
    }

    /// Replace the router switches for subsequent calls
    pub fn update_flags(&self, flags: RouterFlags) {
        tracing::info!(?flags, "Router flags updated");
        self.flags.store(Arc::new(flags));
    }

    /// Build the evaluator request for one call.
    ///
    /// Routers are visited in [`RouterKind::ALL`] order: metadata labels go to
    /// the metadata bag, the nearby switch goes to the bag when on, the
    /// rule-based switch is always written and its labels go to the source
    /// descriptor. The source identity is always the local one.
    pub fn build_request(
        &self,
        target: ServiceInstanceSnapshot,
        context: Option<&RoutingContext>,
        flags: &RouterFlags,
    ) -> RouterInvocationRequest {
        let mut router_metadata = RouterMetadataBag::new();
        let mut source = SourceService {
            namespace: self.identity.namespace.clone(),
            service: self.identity.service.clone(),
            metadata: Labels::new(),
        };

        for kind in RouterKind::ALL {
            let enabled = kind.is_enabled(flags);
            if let Some(entry) = kind.metadata_contribution(enabled, context) {
                router_metadata.insert(kind, entry);
            }
            if let Some(labels) = kind.source_contribution(enabled, context) {
                source.metadata.extend(labels);
            }
        }

        RouterInvocationRequest {
            target,
            source,
            router_metadata,
        }
    }

    /// Run the evaluator; its result, empty or not, is returned unchanged.
    pub fn invoke(&self, request: &RouterInvocationRequest) -> EvaluationResult<RouterInvocationResult> {
        self.evaluator.evaluate(request)
    }
}
