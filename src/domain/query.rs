use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Phrase every blocked response contains.
pub const BLOCKED_MARKER: &str = "blocked by policy";

/// Conversation session identifier.
///
/// Assigned once per request and carried unchanged into the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        SessionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user query awaiting routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text
    pub query: String,

    /// Session identifier (generated when omitted)
    #[serde(default)]
    pub session_id: SessionId,
}

impl QueryRequest {
    /// Create a request with a fresh session id.
    pub fn new(query: impl Into<String>) -> Self {
        QueryRequest {
            query: query.into(),
            session_id: SessionId::new(),
        }
    }

    /// Create a request bound to an existing session.
    pub fn with_session(query: impl Into<String>, session_id: SessionId) -> Self {
        QueryRequest {
            query: query.into(),
            session_id,
        }
    }
}

/// Answer returned for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub text: String,
    pub session_id: SessionId,
}

impl QueryResponse {
    pub fn new(text: impl Into<String>, session_id: SessionId) -> Self {
        QueryResponse {
            text: text.into(),
            session_id,
        }
    }

    /// Response for a request refused by a blocking rule.
    pub fn blocked(reason: &str, session_id: SessionId) -> Self {
        QueryResponse {
            text: format!("Request {}: {}", BLOCKED_MARKER, reason),
            session_id,
        }
    }

    /// Check for the blocked marker phrase.
    pub fn is_blocked(&self) -> bool {
        self.text.contains(BLOCKED_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_generated_when_missing() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert!(!req.session_id.as_str().is_empty());

        let other: QueryRequest = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert_ne!(req.session_id, other.session_id);
    }

    #[test]
    fn test_session_id_preserved_when_given() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"query": "hi", "session_id": "S-42"}"#).unwrap();
        assert_eq!(req.session_id, SessionId::from_string("S-42"));
    }

    #[test]
    fn test_blocked_response_text() {
        let resp = QueryResponse::blocked("Sensitive data detected", SessionId::from_string("S"));

        assert!(resp.text.contains("blocked by policy"));
        assert!(resp.text.contains("Sensitive data detected"));
        assert!(resp.is_blocked());
        assert_eq!(resp.session_id.as_str(), "S");
    }
}
