//! Gemini provider tests against a local stand-in for the Generative
//! Language API.

mod common;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use common::{assert_cross_origin_headers, generated_questions, test_config, TestApp};
use exam_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use exam_service::services::providers::{GenerationParams, ProviderError, TextProvider};
use exam_service::services::questions::QUESTION_PROMPT;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct CapturedRequest {
    target: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.captured.lock().unwrap().push(CapturedRequest {
        target,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body,
    });

    tokio::time::sleep(fake.delay).await;
    (fake.status, Json(fake.reply.clone()))
}

/// Start the stand-in and return its API base URL plus the request log.
async fn spawn_fake_gemini(
    status: StatusCode,
    reply: Value,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = FakeGemini {
        status,
        reply,
        delay,
        captured: captured.clone(),
    };

    let app = Router::new()
        .route("/v1beta/models/:target", post(generate_content))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://127.0.0.1:{}/v1beta", port), captured)
}

fn candidate_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 60, "candidatesTokenCount": 240}
    })
}

fn provider(api_base: &str, timeout: Duration) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: Secret::new("test-key".to_string()),
        model: "gemini-2.0-flash".to_string(),
        api_base: api_base.to_string(),
        timeout,
    })
    .expect("Failed to create provider")
}

#[tokio::test]
async fn generate_posts_prompt_and_returns_text() {
    let (api_base, captured) = spawn_fake_gemini(
        StatusCode::OK,
        candidate_reply("hello from gemini"),
        Duration::ZERO,
    )
    .await;

    let response = provider(&api_base, Duration::from_secs(5))
        .generate("Say hello", &GenerationParams::default())
        .await
        .expect("generation should succeed");

    assert_eq!(response.text, "hello from gemini");
    assert_eq!(response.input_tokens, 60);
    assert_eq!(response.output_tokens, 240);

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "gemini-2.0-flash:generateContent");
    assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));
    assert_eq!(requests[0].body["contents"][0]["role"], "user");
    assert_eq!(requests[0].body["contents"][0]["parts"][0]["text"], "Say hello");
    assert!(requests[0].body.get("generationConfig").is_none());
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let (api_base, _) = spawn_fake_gemini(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}),
        Duration::ZERO,
    )
    .await;

    let err = provider(&api_base, Duration::from_secs(5))
        .generate("prompt", &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited));
}

#[tokio::test]
async fn server_error_is_api_error() {
    let (api_base, _) = spawn_fake_gemini(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"code": 500, "message": "backend down"}}),
        Duration::ZERO,
    )
    .await;

    let err = provider(&api_base, Duration::from_secs(5))
        .generate("prompt", &GenerationParams::default())
        .await
        .unwrap_err();

    match err {
        ProviderError::ApiError(message) => assert!(message.contains("backend down")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (api_base, _) = spawn_fake_gemini(
        StatusCode::OK,
        candidate_reply("too late"),
        Duration::from_secs(3),
    )
    .await;

    let err = provider(&api_base, Duration::from_millis(300))
        .generate("prompt", &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout));
}

#[tokio::test]
async fn configured_key_serves_generated_questions() {
    let fenced = format!("```json\n{}\n```", generated_questions([9, 8, 7, 6, 5]));
    let (api_base, captured) =
        spawn_fake_gemini(StatusCode::OK, candidate_reply(&fenced), Duration::ZERO).await;

    let mut config = test_config();
    config.gemini.api_key = Some(Secret::new("test-key".to_string()));
    config.gemini.api_base = api_base;
    let app = TestApp::spawn_with_config(config).await;

    let response = app
        .client
        .get(app.url("/api/questions"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_cross_origin_headers(response.headers());

    let questions: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<u64> = questions.iter().map(|q| q["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(questions[0]["text"], "Generated question 1");

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body["contents"][0]["parts"][0]["text"],
        QUESTION_PROMPT
    );
}

#[tokio::test]
async fn unreachable_upstream_serves_fallback() {
    // Bind then drop to get a local port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = test_config();
    config.gemini.api_key = Some(Secret::new("test-key".to_string()));
    config.gemini.api_base = format!("http://127.0.0.1:{}/v1beta", port);
    config.gemini.timeout_secs = 2;
    let app = TestApp::spawn_with_config(config).await;

    let response = app
        .client
        .get(app.url("/api/questions"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 5);
    assert_eq!(questions[0]["topic"], "OOP Principles");
    assert_eq!(questions[4]["topic"], "Databases");
}
