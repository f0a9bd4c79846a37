use serde::{Deserialize, Serialize};

use crate::domain::{QueryRequest, SessionId};

/// Body of a query or dry-run evaluation request.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryBody {
    /// Query text
    pub query: String,

    /// Existing session to continue (a new one is generated if omitted)
    #[serde(default)]
    pub session_id: Option<String>,
}

impl QueryBody {
    /// Convert to a domain request, assigning a session id if needed.
    pub fn into_query_request(self) -> QueryRequest {
        let session_id = self
            .session_id
            .filter(|s| !s.trim().is_empty())
            .map(SessionId::from_string)
            .unwrap_or_default();

        QueryRequest::with_session(self.query, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"query": "What is the weather?", "session_id": "abc-123"}"#;

        let body: QueryBody = serde_json::from_str(json).unwrap();
        let req = body.into_query_request();

        assert_eq!(req.query, "What is the weather?");
        assert_eq!(req.session_id.as_str(), "abc-123");
    }

    #[test]
    fn test_missing_or_blank_session_is_generated() {
        let body: QueryBody = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert!(!body.into_query_request().session_id.as_str().is_empty());

        let body: QueryBody = serde_json::from_str(r#"{"query": "hi", "session_id": "  "}"#).unwrap();
        assert_ne!(body.into_query_request().session_id.as_str().trim(), "");
    }
}
