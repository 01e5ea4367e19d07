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

struct SilentLlm;

#[async_trait::async_trait]
impl CompletionProvider for SilentLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        anyhow::bail!("no model in tests")
    }

    fn model(&self) -> &str {
        "test-model"
    }

    fn base_url(&self) -> &str {
        "http://localhost:0/v1"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

struct RejectAllPayments;

#[async_trait::async_trait]
impl PaymentVerifier for RejectAllPayments {
    async fn verify(&self, _reference: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("essai-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());

    let state = essai::api::create_app_state_with_providers(
        config,
        Arc::new(SilentLlm),
        Arc::new(RejectAllPayments),
        None,
    )
    .await
    .expect("Failed to create app state");
    essai::api::router(state)
}

struct TestResponse {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
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

    TestResponse {
        status,
        cookie,
        body,
    }
}

/// Registers an account and returns its session cookie.
async fn register(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "correct horse", "name": "Test" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.cookie.expect("registration should start a session")
}

async fn submit(app: &Router, cookie: &str, topic: &str, score: i32) -> i64 {
    let response = send(
        app,
        "POST",
        "/api/essays",
        Some(cookie),
        Some(json!({
            "topic": topic,
            "content": format!("An essay about {topic} with several words in it."),
            "score": score,
            "feedback": "Fine work",
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["data"]["id"].as_i64().unwrap()
}

fn scores(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["score"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["database"], true);
    assert!(response.body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    for (method, uri) in [
        ("GET", "/api/auth/me"),
        ("GET", "/api/essays"),
        ("DELETE", "/api/essays"),
        ("GET", "/api/autosave"),
        ("GET", "/api/metrics"),
        ("GET", "/api/api-key"),
        ("GET", "/api/diagnostics/llm"),
    ] {
        let response = send(&app, method, uri, None, None).await;
        assert_eq!(
            response.status,
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should be protected"
        );
        assert_eq!(response.body["success"], false);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/essays")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email_any_case() {
    let app = spawn_app().await;

    register(&app, "Alice@Example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "alice@example.COM", "password": "another password" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);

    // The original account still logs in with its own password
    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "long enough" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "bob@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_me_logout() {
    let app = spawn_app().await;
    register(&app, "carol@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "carol@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "CAROL@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.cookie.expect("login should set a session cookie");

    let response = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "carol@example.com");
    assert_eq!(response.body["data"]["has_api_key"], false);

    let response = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_autosave_rejects_short_content() {
    let app = spawn_app().await;
    let cookie = register(&app, "dave@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/autosave",
        Some(&cookie),
        Some(json!({ "content": "   too short   " })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/autosave", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_autosave_lists_recent_drafts() {
    let app = spawn_app().await;
    let cookie = register(&app, "erin@example.com").await;

    for i in 1..=3 {
        let response = send(
            &app,
            "POST",
            "/api/autosave",
            Some(&cookie),
            Some(json!({ "content": format!("Draft number {i} of my essay") })),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["data"]["type"], "Draft");
        assert_eq!(response.body["data"]["score"], 0);
        assert_eq!(response.body["data"]["topic"], "Untitled");
    }

    // A submission is not a draft
    submit(&app, &cookie, "Rivers", 75).await;

    let response = send(&app, "GET", "/api/autosave?limit=2", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let drafts = response.body["data"].as_array().unwrap();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0]["content"], "Draft number 3 of my essay");
    assert_eq!(drafts[1]["content"], "Draft number 2 of my essay");
    assert_eq!(drafts[0]["word_count"], 6);

    let response = send(&app, "GET", "/api/autosave?limit=0", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_autosave_only_stores_drafts() {
    let app = spawn_app().await;
    let cookie = register(&app, "gwen@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/autosave",
        Some(&cookie),
        Some(json!({ "content": "autosaved text here", "type": "Submission" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/autosave",
        Some(&cookie),
        Some(json!({ "content": "autosaved text here", "type": "Draft" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["type"], "Draft");

    let response = send(&app, "GET", "/api/metrics", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_essays"], 0);
    assert_eq!(response.body["data"]["total_drafts"], 1);
}

#[tokio::test]
async fn test_essay_listing_sort_order_and_paging() {
    let app = spawn_app().await;
    let cookie = register(&app, "frank@example.com").await;

    submit(&app, &cookie, "Cities", 70).await;
    submit(&app, &cookie, "Forests", 90).await;
    submit(&app, &cookie, "Oceans", 80).await;

    // Newest first by default
    let response = send(&app, "GET", "/api/essays", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(scores(&response.body), vec![80, 90, 70]);

    let response = send(
        &app,
        "GET",
        "/api/essays?sort=score&order=asc",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(scores(&response.body), vec![70, 80, 90]);

    // Unknown order falls back to descending
    let response = send(
        &app,
        "GET",
        "/api/essays?sort=score&order=sideways",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(scores(&response.body), vec![90, 80, 70]);

    let response = send(
        &app,
        "GET",
        "/api/essays?sort=score&order=asc&take=2&skip=1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(scores(&response.body), vec![80, 90]);

    let response = send(
        &app,
        "GET",
        "/api/essays?sort=topic&order=desc&take=1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.body["data"][0]["topic"], "Oceans");

    let response = send(&app, "GET", "/api/essays?take=0", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/essays?take=1001", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_essay_lookup_by_id_is_owner_scoped() {
    let app = spawn_app().await;
    let owner = register(&app, "gina@example.com").await;
    let stranger = register(&app, "hank@example.com").await;

    let id = submit(&app, &owner, "Mountains", 64).await;

    let response = send(
        &app,
        "GET",
        &format!("/api/essays?id={id}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["topic"], "Mountains");
    assert_eq!(response.body["data"]["type"], "Submission");

    let response = send(
        &app,
        "GET",
        &format!("/api/essays?id={id}"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"].is_null());
}

#[tokio::test]
async fn test_create_essay_validation() {
    let app = spawn_app().await;
    let cookie = register(&app, "ivy@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/essays",
        Some(&cookie),
        Some(json!({ "topic": "Missing content" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/essays",
        Some(&cookie),
        Some(json!({ "topic": "Too high", "content": "Body text", "score": 101 })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Drafts never keep a score
    let response = send(
        &app,
        "POST",
        "/api/essays",
        Some(&cookie),
        Some(json!({ "topic": "Draft", "content": "Body text", "type": "Draft", "score": 55 })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["score"], 0);
}

#[tokio::test]
async fn test_clear_history_only_removes_own_essays() {
    let app = spawn_app().await;
    let first = register(&app, "jack@example.com").await;
    let second = register(&app, "kate@example.com").await;

    submit(&app, &first, "One", 50).await;
    submit(&app, &first, "Two", 60).await;
    send(
        &app,
        "POST",
        "/api/autosave",
        Some(&first),
        Some(json!({ "content": "A draft that also goes away" })),
    )
    .await;
    submit(&app, &second, "Keep me", 70).await;

    let response = send(&app, "DELETE", "/api/essays", Some(&first), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["deleted"], 3);

    let response = send(&app, "GET", "/api/essays", Some(&first), None).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 0);

    let response = send(&app, "GET", "/api/essays", Some(&second), None).await;
    assert_eq!(scores(&response.body), vec![70]);
}

#[tokio::test]
async fn test_essay_stats() {
    let app = spawn_app().await;
    let cookie = register(&app, "liam@example.com").await;

    let response = send(&app, "GET", "/api/metrics", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_essays"], 0);
    assert!(response.body["data"]["highest_score"].is_null());

    submit(&app, &cookie, "First", 60).await;
    submit(&app, &cookie, "Second", 90).await;
    send(
        &app,
        "POST",
        "/api/autosave",
        Some(&cookie),
        Some(json!({ "content": "Work in progress, not scored" })),
    )
    .await;

    let response = send(&app, "GET", "/api/metrics", Some(&cookie), None).await;
    let data = &response.body["data"];
    assert_eq!(data["total_essays"], 2);
    assert_eq!(data["total_drafts"], 1);
    assert_eq!(data["average_score"], 75.0);
    assert_eq!(data["highest_score"], 90);
    assert_eq!(data["lowest_score"], 60);
    assert_eq!(data["latest_score"], 90);

    let recent = data["recent_scores"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["topic"], "First");
    assert_eq!(recent[1]["topic"], "Second");
}

#[tokio::test]
async fn test_prometheus_metrics_disabled_without_handle() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_migrations_create_lookup_indexes() {
    use sea_orm::{ConnectionTrait, Statement};

    let db_path =
        std::env::temp_dir().join(format!("essai-schema-test-{}.db", uuid::Uuid::new_v4()));
    let store = essai::db::Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open store");

    let backend = store.conn.get_database_backend();
    let rows = store
        .conn
        .query_all(Statement::from_string(
            backend,
            "SELECT name FROM sqlite_master WHERE type IN ('index', 'table')".to_string(),
        ))
        .await
        .unwrap();

    let names: Vec<String> = rows
        .iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect();

    for expected in [
        "idx_essays_user_submitted_at",
        "idx_essays_user_type",
        "payment_references",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}: {names:?}");
    }
}

#[tokio::test]
async fn test_responses_carry_api_security_headers() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::CONTENT_SECURITY_POLICY],
        "default-src 'none'; frame-ancestors 'none'; base-uri 'none'"
    );
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}
