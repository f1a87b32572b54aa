//! Mock provider for testing.

use super::{ProviderError, TextProvider};
use crate::prompt::ChatTurn;
use async_trait::async_trait;
use std::sync::Mutex;

enum MockBehavior {
    Reply(String),
    Status { status: u16, body: String },
}

/// Mock text provider that records every conversation it receives.
pub struct MockTextProvider {
    behavior: MockBehavior,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl MockTextProvider {
    /// Always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Reply(reply.into()))
    }

    /// Always fails as if the API returned `status`.
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Status {
            status,
            body: body.into(),
        })
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Conversations received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(turns.to_vec());
        }

        match &self.behavior {
            MockBehavior::Reply(reply) => Ok(reply.clone()),
            MockBehavior::Status { status, body } => Err(ProviderError::Upstream {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
