//! End-to-end flows that go through the external API seams: scoring,
//! payment-gated API keys and LLM diagnostics.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use essai::clients::llm::{ChatMessage, CompletionProvider};
use essai::clients::paystack::PaymentVerifier;
use essai::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SCORED_REPLY: &str = r#"Here is my assessment:
{"grammar": 18, "structure": 17, "coherence": 16, "relevance": 13,
 "vocabulary": 12, "overusedWords": 8,
 "explanation": "Clear argument with minor slips.",
 "suggestions": ["Vary sentence openings", "Tighten the conclusion"]}"#;

/// Replies with a fixed text, or fails when no reply is set.
struct FixedLlm {
    reply: Option<&'static str>,
}

#[async_trait::async_trait]
impl CompletionProvider for FixedLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        assert!(!messages.is_empty());
        self.reply
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("upstream returned 503"))
    }

    fn model(&self) -> &str {
        "fixed-model"
    }

    fn base_url(&self) -> &str {
        "http://llm.test/v1"
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// References starting with `paid_` are settled, `error_` simulates an
/// unreachable payment API, anything else is unpaid.
struct PrefixPayments;

#[async_trait::async_trait]
impl PaymentVerifier for PrefixPayments {
    async fn verify(&self, reference: &str) -> anyhow::Result<bool> {
        if reference.starts_with("error_") {
            anyhow::bail!("payment API timed out");
        }
        Ok(reference.starts_with("paid_"))
    }
}

async fn spawn_app(reply: Option<&'static str>) -> Router {
    let db_path =
        std::env::temp_dir().join(format!("essai-smoke-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());

    let state = essai::api::create_app_state_with_providers(
        config,
        Arc::new(FixedLlm { reply }),
        Arc::new(PrefixPayments),
        None,
    )
    .await
    .expect("failed to create app state");

    essai::api::router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    auth: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in auth {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, cookie, body) = call(
        app,
        "POST",
        "/api/auth/register",
        &[],
        Some(json!({ "email": email, "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body:?}");
    cookie.expect("missing session cookie")
}

#[tokio::test]
async fn test_score_and_save() {
    let app = spawn_app(Some(SCORED_REPLY)).await;
    let cookie = register(&app, "writer@example.com").await;
    let auth = [("cookie", cookie.as_str())];

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/score",
        &auth,
        Some(json!({ "topic": "Cities", "content": "Cities grow because...", "save": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body:?}");
    let data = &body["data"];
    assert_eq!(data["score"], 84);
    assert_eq!(data["sub_scores"]["grammar"], 18);
    assert_eq!(data["sub_scores"]["overused_words"], 8);
    assert_eq!(data["suggestions"].as_array().unwrap().len(), 2);

    let essay_id = data["essay_id"].as_i64().expect("scored essay was saved");

    let (_, _, body) = call(
        &app,
        "GET",
        &format!("/api/essays?id={essay_id}"),
        &auth,
        None,
    )
    .await;
    assert_eq!(body["data"]["score"], 84);
    assert_eq!(body["data"]["type"], "Submission");
    assert!(
        body["data"]["feedback"]
            .as_str()
            .unwrap()
            .contains("Tighten the conclusion")
    );
}

#[tokio::test]
async fn test_score_without_save_persists_nothing() {
    let app = spawn_app(Some(SCORED_REPLY)).await;
    let cookie = register(&app, "reader@example.com").await;
    let auth = [("cookie", cookie.as_str())];

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/score",
        &auth,
        Some(json!({ "topic": "Cities", "content": "Cities grow because..." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["essay_id"].is_null());

    let (_, _, body) = call(&app, "GET", "/api/essays", &auth, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_score_reply_without_json_fails() {
    let app = spawn_app(Some("I would rather not grade this essay.")).await;
    let cookie = register(&app, "unlucky@example.com").await;

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/score",
        &[("cookie", cookie.as_str())],
        Some(json!({ "topic": "Cities", "content": "Cities grow because...", "save": true })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to score essay. Please try again.");

    let (_, _, body) = call(
        &app,
        "GET",
        "/api/essays",
        &[("cookie", cookie.as_str())],
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_score_requires_topic_and_content() {
    let app = spawn_app(Some(SCORED_REPLY)).await;
    let cookie = register(&app, "hasty@example.com").await;

    let (status, _, _) = call(
        &app,
        "POST",
        "/api/score",
        &[("cookie", cookie.as_str())],
        Some(json!({ "topic": "  ", "content": "Something" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_key_issuance_flow() {
    let app = spawn_app(Some(SCORED_REPLY)).await;
    let buyer = register(&app, "buyer@example.com").await;
    let other = register(&app, "other@example.com").await;

    let (status, _, body) = call(
        &app,
        "GET",
        "/api/api-key",
        &[("cookie", buyer.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["api_key"].is_null());

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", buyer.as_str())],
        Some(json!({ "reference": "unpaid_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment verification failed");

    // Payment API trouble reads as "not verified"
    let (status, _, _) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", buyer.as_str())],
        Some(json!({ "reference": "error_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", buyer.as_str())],
        Some(json!({ "reference": "paid_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    let key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 64);

    // Same user, same reference: same key
    let (status, _, body) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", buyer.as_str())],
        Some(json!({ "reference": "paid_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api_key"], key.as_str());

    let (status, _, _) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", other.as_str())],
        Some(json!({ "reference": "paid_1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The key authenticates on its own, by header or bearer token
    let (status, _, body) = call(
        &app,
        "GET",
        "/api/auth/me",
        &[("X-Api-Key", key.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "buyer@example.com");
    assert_eq!(body["data"]["has_api_key"], true);

    let bearer = format!("Bearer {key}");
    let (status, _, _) = call(
        &app,
        "GET",
        "/api/essays",
        &[("authorization", bearer.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Query-string keys are off unless enabled
    let (status, _, _) = call(&app, "GET", &format!("/api/essays?api_key={key}"), &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_superseded_reference_stays_claimed() {
    let app = spawn_app(Some(SCORED_REPLY)).await;
    let first = register(&app, "first@example.com").await;
    let second = register(&app, "second@example.com").await;

    for reference in ["paid_a", "paid_b"] {
        let (status, _, body) = call(
            &app,
            "POST",
            "/api/api-key",
            &[("cookie", first.as_str())],
            Some(json!({ "reference": reference })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body:?}");
    }

    // paid_a is no longer the reference behind first's current key
    let (status, _, body) = call(
        &app,
        "POST",
        "/api/api-key",
        &[("cookie", second.as_str())],
        Some(json!({ "reference": "paid_a" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body:?}");

    let (_, _, body) = call(
        &app,
        "GET",
        "/api/api-key",
        &[("cookie", second.as_str())],
        None,
    )
    .await;
    assert!(body["data"]["api_key"].is_null());
}

#[tokio::test]
async fn test_llm_diagnostics() {
    let app = spawn_app(Some("pong")).await;
    let cookie = register(&app, "ops@example.com").await;
    let auth = [("cookie", cookie.as_str())];

    let (status, _, body) = call(&app, "GET", "/api/diagnostics/llm", &auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["configured"], true);
    assert_eq!(body["data"]["model"], "fixed-model");
    assert_eq!(body["data"]["base_url"], "http://llm.test/v1");

    let (status, _, body) = call(&app, "POST", "/api/diagnostics/llm", &auth, None).await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body["data"]["reply"], "pong");
    assert!(body["data"]["latency_ms"].is_u64());
}

#[tokio::test]
async fn test_llm_diagnostics_upstream_failure() {
    let app = spawn_app(None).await;
    let cookie = register(&app, "oncall@example.com").await;

    let (status, _, body) = call(
        &app,
        "POST",
        "/api/diagnostics/llm",
        &[("cookie", cookie.as_str())],
        Some(json!({ "prompt": "Are you there?" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}
