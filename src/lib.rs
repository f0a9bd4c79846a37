pub mod api;
pub mod backend;
pub mod config;
pub mod domain;
pub mod execution;
pub mod observability;
pub mod policy;
pub mod rules;

pub use backend::{BackendError, ModelService};
pub use config::Config;
pub use domain::{PolicyRule, QueryRequest, QueryResponse, RoutingDecision};
pub use execution::{ExecutionCoordinator, ExecutionError};
pub use rules::{evaluate, RuleBook, RuleProvider};
