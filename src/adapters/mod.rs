pub mod local_evaluator;

/// Re-export commonly used types from adapters
pub use local_evaluator::LocalRouterEvaluator;
