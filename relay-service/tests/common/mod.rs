#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response, Router};
use relay_service::config::{GeminiSettings, LoreSettings, RelayConfig};
use relay_service::lore::{LoreSource, LoreStore};
use relay_service::services::providers::mock::MockTextProvider;
use relay_service::startup::{build_router, AppState, Application};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "gemini-2.5-flash";
pub const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

pub fn test_config(gemini_base: &str, lore: LoreSource) -> RelayConfig {
    RelayConfig {
        common: CoreConfig {
            port: 0,
            ..CoreConfig::default()
        },
        gemini: GeminiSettings {
            api_key: TEST_API_KEY.to_string(),
            api_base: gemini_base.to_string(),
            model: TEST_MODEL.to_string(),
            timeout_secs: 5,
            temperature: None,
            max_output_tokens: None,
        },
        lore: LoreSettings { source: lore },
    }
}

pub fn inline_lore() -> LoreSource {
    LoreSource::Inline("Yavar is a world of drifting continents.".to_string())
}

/// Lore source that always fails to load.
pub fn missing_lore() -> LoreSource {
    LoreSource::TextFile(
        std::env::temp_dir().join(format!("missing-lore-{}.txt", uuid::Uuid::new_v4())),
    )
}

/// Router backed by the mock provider, for in-process `oneshot` tests.
pub fn mock_router(lore: LoreSource, provider: Arc<MockTextProvider>) -> Router {
    let state = AppState::new(LoreStore::new(lore, reqwest::Client::new()), provider);
    build_router(state)
}

/// Gemini success payload with a single candidate.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

pub fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the full application against real Gemini and lore clients.
    pub async fn spawn(config: RelayConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp { address, port }
    }

    pub async fn post_message(&self, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
