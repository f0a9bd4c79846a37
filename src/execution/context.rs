use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{DispatchTarget, SessionId};

/// Request-scoped execution record.
///
/// Created per call to the coordinator and never shared between requests.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub session_id: SessionId,

    /// Backend chosen for dispatch (`None` for blocked requests)
    pub target: Option<DispatchTarget>,

    /// Rule that decided the route, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<String>,

    /// Warnings raised by matching rules
    pub warnings: Vec<String>,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionContext {
    pub fn new(session_id: SessionId, matched_rule: Option<String>) -> Self {
        ExecutionContext {
            session_id,
            target: None,
            matched_rule,
            warnings: Vec::new(),
            started_at: Utc::now(),
            dispatched_at: None,
            completed_at: None,
        }
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Mark the start of the single dispatch.
    pub fn begin_dispatch(&mut self, target: DispatchTarget) {
        self.target = Some(target);
        self.dispatched_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Milliseconds from start to completion (or now, if still running).
    pub fn elapsed_ms(&self) -> i64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lifecycle() {
        let mut ctx = ExecutionContext::new(SessionId::from_string("S1"), Some("rule".to_string()));
        assert!(ctx.target.is_none());
        assert!(ctx.dispatched_at.is_none());

        ctx.add_warning("careful");
        ctx.begin_dispatch(DispatchTarget::Local);
        ctx.complete();

        assert_eq!(ctx.target, Some(DispatchTarget::Local));
        assert_eq!(ctx.warnings, vec!["careful".to_string()]);
        assert!(ctx.dispatched_at.unwrap() >= ctx.started_at);
        assert!(ctx.elapsed_ms() >= 0);
    }
}
