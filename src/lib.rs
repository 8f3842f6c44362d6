//! mesh-router - client-side request routing for service-mesh clients.
//!
//! Given the instances discovery returned for a target service and the inbound
//! request that triggered the call, the routing pipeline produces the subset
//! of instances eligible to receive the call.
//!
//! # Features
//! - Routing labels carried in a percent-encoded JSON header, merged across
//!   repeated header values
//! - Transitive labels propagated along the call chain, passed in explicitly
//! - A fixed router chain: metadata equality, nearby (zone / region affinity)
//!   and rule-based routing, each switchable at runtime
//! - A pluggable router evaluation port with an in-process implementation
//! - Configuration from TOML / YAML / JSON with validation
//! - Structured tracing and `metrics` facade counters
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use mesh_router::{
//!     InboundRequest, LocalRouterEvaluator, RoutingPipeline, ServiceInstanceRecord,
//!     config::RouterConfig,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let cfg: RouterConfig = mesh_router::config::loader::load_config_sync("router.toml")?;
//! let pipeline = RoutingPipeline::new(
//!     cfg.identity(),
//!     cfg.flags(),
//!     cfg.label_header.clone(),
//!     Arc::new(LocalRouterEvaluator::new(cfg.location.clone())),
//! );
//!
//! let request = InboundRequest::default()
//!     .with_header("X-Router-Label", "%7B%22env%22%3A%22prod%22%7D");
//! let instances = vec![ServiceInstanceRecord::new("orders", "i-1", "10.0.0.1", 8080)];
//! let eligible = pipeline.route(instances, Some(&request))?;
//! # let _ = eligible;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! Routing logic lives in `core`, the router evaluation engine is reached
//! through the [`RouterEvaluator`] port, and `adapters` holds in-process
//! implementations of the ports.
//!
//! # Error Handling
//! Library operations return domain specific error types
//! ([`RoutingError`], [`LabelDecodeError`], [`EvaluationError`]); nothing is
//! logged and swallowed. The binary and the configuration loader use
//! `eyre::Result` with context attached through `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::LocalRouterEvaluator,
    core::{
        InboundRequest, LabelDecodeError, LabelSet, Labels, LocalIdentity, Location,
        RouterFlags, RouterKind, RoutingContext, RoutingError, RoutingPipeline,
        ServiceInstanceRecord, ServiceInstanceSnapshot,
    },
    ports::router_evaluator::{EvaluationError, RouterEvaluator},
};
