//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` endpoint of Google's Gemini API with the
//! assembled multi-turn conversation.

use super::{GenerationParams, ProviderError, TextProvider};
use crate::config::GeminiSettings;
use crate::prompt::{ChatTurn, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::PropagateTrace;
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
    pub params: GenerationParams,
}

impl From<&GeminiSettings> for GeminiConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            params: GenerationParams {
                temperature: settings.temperature,
                max_tokens: settings.max_output_tokens,
            },
        }
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given method. The key travels as a query
    /// parameter, so this string must never be logged.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method,
            self.config.api_key
        )
    }

    fn build_request<'a>(&self, turns: &'a [ChatTurn]) -> GenerateContentRequest<'a> {
        let params = &self.config.params;

        GenerateContentRequest {
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: turn.role,
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            generation_config: (!params.is_empty()).then(|| GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            }),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, ProviderError> {
        let request = self.build_request(turns);

        tracing::debug!(
            model = %self.config.model,
            turn_count = turns.len(),
            prompt_len = turns.iter().map(|t| t.text.len()).sum::<usize>(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .with_trace_context()
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Error from Gemini API");

            return Err(ProviderError::Upstream {
                status,
                body: compact_body(&body),
            });
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "Failed to parse response: {}",
                e.without_url()
            ))
        })?;

        let candidate = api_response.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedResponse("response contained no candidates".to_string())
        })?;

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ProviderError::MalformedResponse(format!(
                    "first candidate has no text (finish reason: {})",
                    if finish_reason.is_empty() {
                        "unknown"
                    } else {
                        finish_reason.as_str()
                    }
                ))
            })
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Re-serialize JSON error bodies on one line; pass anything else through.
fn compact_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: Role,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(params: GenerationParams) -> GeminiTextProvider {
        GeminiTextProvider::new(GeminiConfig {
            api_key: "test-key".to_string(),
            api_base: "https://example.test/v1beta/".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(5),
            params,
        })
        .unwrap()
    }

    #[test]
    fn api_url_includes_model_method_and_key() {
        assert_eq!(
            provider(GenerationParams::default()).api_url("generateContent"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent?key=test-key"
        );
    }

    #[test]
    fn request_serializes_turns_with_roles() {
        let turns = vec![
            ChatTurn::user("briefing"),
            ChatTurn::model("greeting"),
            ChatTurn::user("hello"),
        ];
        let body = serde_json::to_value(provider(GenerationParams::default()).build_request(&turns))
            .unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "briefing" }] },
                    { "role": "model", "parts": [{ "text": "greeting" }] },
                    { "role": "user", "parts": [{ "text": "hello" }] }
                ]
            })
        );
    }

    #[test]
    fn generation_config_only_carries_set_fields() {
        let turns = vec![ChatTurn::user("hello")];
        let body = serde_json::to_value(
            provider(GenerationParams {
                temperature: Some(0.5),
                max_tokens: None,
            })
            .build_request(&turns),
        )
        .unwrap();

        assert_eq!(body["generationConfig"], json!({ "temperature": 0.5 }));
    }

    #[test]
    fn blank_api_key_fails_health_check() {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: " ".to_string(),
            api_base: "https://example.test".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(5),
            params: GenerationParams::default(),
        })
        .unwrap();

        assert!(matches!(
            provider.health_check(),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn compact_body_flattens_json() {
        assert_eq!(
            compact_body("{\n  \"error\": { \"code\": 400 }\n}"),
            r#"{"error":{"code":400}}"#
        );
        assert_eq!(compact_body(" Bad Gateway \n"), "Bad Gateway");
    }
}
