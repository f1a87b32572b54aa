//! Text generation provider abstraction.
//!
//! The relay only needs "conversation in, reply text out"; the trait keeps the
//! Gemini client swappable for the mock used in tests.

pub mod gemini;
pub mod mock;

use crate::prompt::ChatTurn;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The API answered with a non-success status.
    #[error("Gemini API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    /// A success status whose body had no usable reply.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Metric label for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Upstream { status: 429, .. } => "rate_limited",
            ProviderError::Upstream { .. } => "upstream_status",
            ProviderError::NetworkError(_) => "network",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Sampling parameters forwarded as `generationConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,
}

impl GenerationParams {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_tokens.is_none()
    }
}

/// Trait for chat-style text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate the reply to the last turn of `turns`.
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;

    /// Cheap local readiness check; does not call the API.
    fn health_check(&self) -> Result<(), ProviderError>;
}
