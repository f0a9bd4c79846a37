use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use super::traits::{BackendError, ModelService};

/// Scripted behaviour of a [`MockModelService`].
#[derive(Debug, Clone)]
enum MockReply {
    Echo,
    Fixed(String),
    Fail(BackendError),
}

/// Mock model service for testing.
///
/// Records every query it receives.
#[derive(Debug)]
pub struct MockModelService {
    name: String,
    reply: MockReply,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockModelService {
    /// Mock that answers `"answer: <query>"`.
    pub fn new(name: impl Into<String>) -> Self {
        MockModelService {
            name: name.into(),
            reply: MockReply::Echo,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mock that always answers `text`.
    pub fn with_answer(name: impl Into<String>, text: impl Into<String>) -> Self {
        MockModelService {
            reply: MockReply::Fixed(text.into()),
            ..Self::new(name)
        }
    }

    /// Mock that always fails with `error`.
    pub fn failing(name: impl Into<String>, error: BackendError) -> Self {
        MockModelService {
            reply: MockReply::Fail(error),
            ..Self::new(name)
        }
    }

    /// Sleep before replying (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times the service was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Queries received, in order (for assertions).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ModelService for MockModelService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_answer(&self, query: &str) -> Result<String, BackendError> {
        self.calls.lock().push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Echo => Ok(format!("answer: {}", query)),
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Fail(e) => Err(e.clone()),
        }
    }
}
