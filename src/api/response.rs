use serde::Serialize;

use crate::domain::{RoutingDecision, SessionId};
use crate::execution::ExecutionOutcome;
use crate::rules::MatchedRule;

/// Answer to a query.
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub text: String,

    pub session_id: SessionId,

    /// How the query was routed
    pub decision: RoutingDecision,

    /// Warnings raised while routing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<ExecutionOutcome> for QueryResult {
    fn from(outcome: ExecutionOutcome) -> Self {
        QueryResult {
            text: outcome.response.text,
            session_id: outcome.response.session_id,
            decision: outcome.decision,
            warnings: outcome.context.warnings,
        }
    }
}

/// Dry-run evaluation result.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub decision: RoutingDecision,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<MatchedRule>,

    pub rules_checked: usize,
    pub policy_version: String,
    pub session_id: SessionId,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub policy_version: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub policy_version: String,
    pub rules: usize,
    pub enabled_rules: usize,
    pub cloud_configured: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueryResponse;
    use crate::execution::ExecutionContext;

    #[test]
    fn test_query_result_serialization() {
        let session = SessionId::from_string("S1");
        let mut context = ExecutionContext::new(session.clone(), None);
        context.add_warning("Personal data mentioned");

        let result = QueryResult::from(ExecutionOutcome {
            response: QueryResponse::new("ok", session),
            decision: RoutingDecision::Warn {
                message: "Personal data mentioned".to_string(),
            },
            context,
        });

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["text"], "ok");
        assert_eq!(json["session_id"], "S1");
        assert_eq!(json["decision"]["type"], "warn");
        assert_eq!(json["warnings"][0], "Personal data mentioned");
    }

    #[test]
    fn test_error_response() {
        let resp = ErrorResponse::bad_request("query must not be empty");
        let json = serde_json::to_string(&resp).unwrap();

        assert!(json.contains("BAD_REQUEST"));
        assert!(!json.contains("session_id"));
    }
}
