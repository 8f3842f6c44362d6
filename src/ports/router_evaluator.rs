use thiserror::Error;

use crate::core::router_chain::{RouterInvocationRequest, RouterInvocationResult};

/// Error raised by a router evaluation engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluationError {
    /// A single router failed while filtering
    #[error("Router '{router}' failed: {message}")]
    RouterFailed {
        /// Identifier of the failing router
        router: String,
        /// Failure description
        message: String,
    },

    /// The evaluation engine could not be reached
    #[error("Router evaluator unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected by the engine
    #[error("Invalid router request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for router evaluation
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// RouterEvaluator defines the port to the engine that runs the router plugins
///
/// Evaluation is a synchronous boundary call. Timeouts, retries and
/// concurrency limits belong to the implementation, not to its callers.
pub trait RouterEvaluator: Send + Sync + 'static {
    /// Run the routers described by `request` over its target snapshot
    ///
    /// # Arguments
    /// * `request` - Target instances, source service and per-router metadata
    ///
    /// # Returns
    /// The filtered snapshot; an empty snapshot means no eligible instance
    fn evaluate(&self, request: &RouterInvocationRequest)
    -> EvaluationResult<RouterInvocationResult>;
}
