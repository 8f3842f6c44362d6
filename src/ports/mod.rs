pub mod router_evaluator;
