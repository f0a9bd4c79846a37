use thiserror::Error;

use crate::backend::BackendError;
use crate::domain::DispatchTarget;

/// Failure to produce an answer for a routed query.
///
/// A blocked query is not an error; it is answered with a blocked response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The cloud path was selected but cannot run: not configured,
    /// unreachable or timed out.
    #[error("cloud execution path unavailable: {reason}")]
    CloudUnavailable { reason: String },

    /// The selected backend ran and failed.
    #[error("{target} dispatch failed: {source}")]
    Backend {
        target: DispatchTarget,
        #[source]
        source: BackendError,
    },
}

impl ExecutionError {
    #[inline]
    pub fn is_cloud_unavailable(&self) -> bool {
        matches!(self, ExecutionError::CloudUnavailable { .. })
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionError::CloudUnavailable { .. } => "CLOUD_UNAVAILABLE",
            ExecutionError::Backend { .. } => "BACKEND_FAILURE",
        }
    }
}
