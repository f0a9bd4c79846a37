use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by an inference backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or is not implemented.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend was reached but did not produce a usable answer.
    #[error("backend failed: {0}")]
    Failed(String),
}

/// Query-to-answer inference capability.
///
/// Implementations must tolerate concurrent calls from independent requests.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Generate an answer for the query.
    async fn generate_answer(&self, query: &str) -> Result<String, BackendError>;
}
