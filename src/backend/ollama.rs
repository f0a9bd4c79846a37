use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::traits::{BackendError, ModelService};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Model service backed by an Ollama-compatible `/api/chat` endpoint.
///
/// Connection failures and timeouts are reported as
/// [`BackendError::Unavailable`]; error statuses and empty or malformed
/// answers as [`BackendError::Failed`].
pub struct OllamaModelService {
    name: String,
    chat_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaModelService {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:11434`).
    ///
    /// Fails if the HTTP client cannot be built with the requested timeouts.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(OllamaModelService {
            name: name.into(),
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.into(),
            client,
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn classify(err: reqwest::Error) -> BackendError {
    if err.is_connect() || err.is_timeout() {
        BackendError::Unavailable(err.to_string())
    } else {
        BackendError::Failed(err.to_string())
    }
}

#[async_trait]
impl ModelService for OllamaModelService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_answer(&self, query: &str) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: query,
            }],
            stream: false,
        };

        debug!(backend = %self.name, model = %self.model, "Sending chat request");

        let resp = self
            .client
            .post(&self.chat_url)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(BackendError::Unavailable(format!("{} returned {}", self.name, status)));
        }
        if !status.is_success() {
            return Err(BackendError::Failed(format!("{} returned {}", self.name, status)));
        }

        let chat: ChatResponse = resp.json().await.map_err(classify)?;
        let content = chat.message.content.trim();
        if content.is_empty() {
            return Err(BackendError::Failed(format!("{} returned an empty answer", self.name)));
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_normalization() {
        let svc = OllamaModelService::new(
            "local",
            "http://127.0.0.1:11434/",
            "qwen3:0.6b",
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(svc.chat_url(), "http://127.0.0.1:11434/api/chat");
        assert_eq!(svc.model(), "qwen3:0.6b");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["stream"], false);
    }
}
