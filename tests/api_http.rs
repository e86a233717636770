// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - /api/configs CRUD (generated ids, in-place replace, delete)
// - POST /api/exclude idempotence
// - /api/collect add/duplicate/delete with remaining count
// - /api/generate-draft (GET hint, success, error envelope)

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value as Json};
use tempfile::TempDir;
use tower::ServiceExt as _; // for `oneshot`

use newsdesk::api::{create_router, AppState};
use newsdesk::config::Settings;
use newsdesk::draft::{GenerationApi, GenerationError};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct FixedApi {
    outcome: Result<String, GenerationError>,
}

#[async_trait]
impl GenerationApi for FixedApi {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, GenerationError> {
        self.outcome.clone()
    }
}

fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: dir.path().to_path_buf(),
        naver_client_id: None,
        naver_client_secret: None,
        gemini_api_key: None,
        tistory_access_token: None,
        tistory_blog_name: None,
    }
}

/// Build the same Router the binary uses, backed by a temp data dir.
fn test_router(dir: &TempDir, outcome: Result<String, GenerationError>) -> Router {
    let settings = test_settings(dir);
    let state = AppState::new(&settings, Arc::new(FixedApi { outcome }));
    create_router(state)
}

fn draft_router(dir: &TempDir) -> Router {
    test_router(
        dir,
        Ok(r#"{"title":"T","content":"C","tags":["a","b","c","d","e"]}"#.to_string()),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn configs_start_with_the_builtin_provider() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let (status, body) = send(&app, "GET", "/api/configs", None).await;
    assert_eq!(status, StatusCode::OK);
    let configs = body.as_array().expect("array of configs");
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0]["id"], "naver");
    assert_eq!(configs[0]["type"], "builtin");
}

#[tokio::test]
async fn config_upsert_generates_id_and_replaces_in_place() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let payload = json!({
        "name": "공공데이터 API",
        "type": "custom",
        "url": "https://api.example.go.kr/news",
        "itemPath": "response.body.items"
    });
    let (status, body) = send(&app, "POST", "/api/configs", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let configs = body["configs"].as_array().unwrap();
    assert_eq!(configs.len(), 2);
    let id = configs[1]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty() && id != "naver");

    // Same id → replace without growing the store.
    let update = json!({ "id": id, "name": "이름 변경", "type": "custom" });
    let (_, body) = send(&app, "POST", "/api/configs", Some(update)).await;
    let configs = body["configs"].as_array().unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[1]["name"], "이름 변경");
}

#[tokio::test]
async fn config_delete_removes_entry() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let (_, body) = send(
        &app,
        "POST",
        "/api/configs",
        Some(json!({ "name": "tmp", "type": "custom" })),
    )
    .await;
    let id = body["configs"][1]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/configs/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, "GET", "/api/configs", None).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["id"] != id.as_str()));
}

#[tokio::test]
async fn exclude_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            "/api/exclude",
            Some(json!({ "link": "http://x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let stored: Vec<String> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("excluded_news.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stored, vec!["http://x".to_string()]);
}

#[tokio::test]
async fn collect_roundtrip_with_duplicate_and_delete() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let article = json!({
        "title": "기사",
        "link": "http://news/1",
        "description": "요약",
        "pubDate": "2026-08-24T00:00:00Z"
    });
    // Duplicate insert is a no-op that still reports success.
    for _ in 0..2 {
        let (status, body) = send(&app, "POST", "/api/collect", Some(article.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, body) = send(&app, "GET", "/api/collect", None).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["link"], "http://news/1");
    assert!(entries[0]["collectedAt"].is_string());

    let (status, body) = send(
        &app,
        "DELETE",
        "/api/collect",
        Some(json!({ "link": "http://news/1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn search_without_naver_keys_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let (status, body) = send(&app, "GET", "/api/search?query=반도체", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(".env"));
}

#[tokio::test]
async fn generate_draft_get_answers_405_hint() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let (status, body) = send(&app, "GET", "/api/generate-draft", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["error"].as_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn generate_draft_returns_parsed_result() {
    let dir = TempDir::new().unwrap();
    let app = draft_router(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate-draft",
        Some(json!({ "title": "<b>제목</b>", "description": "요약" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
    assert_eq!(body["tags"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn generate_draft_failure_uses_error_envelope() {
    let dir = TempDir::new().unwrap();
    let app = test_router(
        &dir,
        Err(GenerationError::Failed("quota exceeded".to_string())),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate-draft",
        Some(json!({ "title": "t", "description": "d" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("quota exceeded"), "got: {message}");
}
