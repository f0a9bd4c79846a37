pub mod context;
pub mod coordinator;
pub mod error;

pub use context::ExecutionContext;
pub use coordinator::{ExecutionCoordinator, ExecutionOutcome, DEFAULT_CLOUD_TIMEOUT};
pub use error::ExecutionError;
