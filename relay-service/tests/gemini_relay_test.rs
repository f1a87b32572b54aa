//! End-to-end tests: spawned application, Gemini and the lore host stubbed
//! with wiremock.

mod common;

use common::*;
use relay_service::lore::LoreSource;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_lore(server: &MockServer, expected_fetches: u64) -> LoreSource {
    Mock::given(method("GET"))
        .and(path("/lore.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "world": "Yavar",
            "factions": ["Archions", "Wardens"]
        })))
        .expect(expected_fetches)
        .mount(server)
        .await;

    LoreSource::Remote {
        url: format!("{}/lore.json", server.uri()),
    }
}

#[tokio::test]
async fn relays_message_and_returns_first_candidate() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;
    let lore = mount_lore(&lore_host, 1).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("hi")))
        .expect(1)
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;
    let response = app.post_message(json!({ "message": "hello" })).await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "reply": "hi" }));
}

#[tokio::test]
async fn sends_three_turn_conversation_with_json_lore() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;
    let lore = mount_lore(&lore_host, 1).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;
    app.post_message(json!({ "message": "Who are the Archions?" }))
        .await;

    let requests = gemini.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();

    let contents = sent["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["text"], "Who are the Archions?");

    let briefing = contents[0]["parts"][0]["text"].as_str().unwrap();
    assert!(briefing.contains("### LORE KNOWLEDGE BASE (JSON FORMAT) ###"));
    assert!(briefing.contains("\"world\": \"Yavar\""));
    assert!(sent.get("generationConfig").is_none());
}

#[tokio::test]
async fn lore_is_fetched_once_across_requests() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;
    // wiremock verifies the expectation when the server drops
    let lore = mount_lore(&lore_host, 1).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
        .expect(3)
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;
    for _ in 0..3 {
        let response = app.post_message(json!({ "message": "ping" })).await;
        assert_eq!(response.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn concurrent_first_requests_share_one_lore_fetch() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lore.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "world": "Yavar" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&lore_host)
        .await;
    let lore = LoreSource::Remote {
        url: format!("{}/lore.json", lore_host.uri()),
    };

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
        .expect(4)
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;
    let (a, b, c, d) = tokio::join!(
        app.post_message(json!({ "message": "one" })),
        app.post_message(json!({ "message": "two" })),
        app.post_message(json!({ "message": "three" })),
        app.post_message(json!({ "message": "four" })),
    );

    for response in [a, b, c, d] {
        assert_eq!(response.status().as_u16(), 200);
    }
    assert_eq!(lore_host.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn upstream_error_status_is_reported_as_500() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;
    let lore = mount_lore(&lore_host, 1).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;
    let response = app.post_message(json!({ "message": "hello" })).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("[SYSTEM_ERROR:: Relay connection failure"));
    assert!(error.contains("Gemini API returned status 400"));
    assert!(error.contains("API key not valid"));
    assert!(!error.contains(TEST_API_KEY));
}

#[tokio::test]
async fn candidate_without_text_is_reported_as_500() {
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), inline_lore())).await;
    let response = app.post_message(json!({ "message": "hello" })).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("SAFETY"));
}

#[tokio::test]
async fn failed_lore_fetch_skips_upstream_and_is_retried() {
    let gemini = MockServer::start().await;
    let lore_host = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lore.json"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .expect(1)
        .mount(&lore_host)
        .await;
    let lore = mount_lore(&lore_host, 1).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("recovered")))
        .expect(1)
        .mount(&gemini)
        .await;

    let app = TestApp::spawn(test_config(&gemini.uri(), lore)).await;

    let first = app.post_message(json!({ "message": "hello" })).await;
    assert_eq!(first.status().as_u16(), 500);
    let body: Value = first.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unable to retrieve Omni Console Knowledge Base"));

    let second = app.post_message(json!({ "message": "hello" })).await;
    assert_eq!(second.status().as_u16(), 200);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["reply"], "recovered");
}
