use std::path::Path;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::{DBService, store::StoreLocation};
use serde_json::{Value, json};
use services::services::{
    analysis_cache::AnalysisCache,
    media_insight::{Analysis, AnalyzeMediaRequest},
    portfolio_import,
};
use tempfile::TempDir;
use tower::ServiceExt;
use utils::jwt::issue_user_token;

use crate::{AppState, app, config::ServerConfig, cors_layer};

const SECRET: &str = "test-secret";

const CSV: &str = "\
title,type,date,description,url
Old Reel,video,2019,First reel,https://example.com/reel
Palette Tool,tool,07/2025,Extracts colors,https://example.com/palette
Undated Sketch,art,,Pencil study,
";

async fn test_app(store_dir: &Path) -> (Router, DBService) {
    let db = DBService::new_in_memory().await.unwrap();
    let dir = store_dir.to_string_lossy().to_string();
    let config = ServerConfig::from_lookup(|name| match name {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "LOCAL_STORE_DIR" => Some(dir.clone()),
        _ => None,
    })
    .unwrap();
    let state = AppState::from_config(db.clone(), &config).unwrap();
    (app(state, cors_layer(None).unwrap()), db)
}

fn token(user_id: &str) -> String {
    issue_user_token(user_id, chrono::Duration::hours(1), SECRET.as_bytes()).unwrap()
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let (status, body) = send(&app, request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["local_stores"], true);
    assert_eq!(body["data"]["ai"], false);
}

#[tokio::test]
async fn seeded_portfolio_is_listed_newest_date_first() {
    let dir = TempDir::new().unwrap();
    let (app, db) = test_app(dir.path()).await;
    let csv_path = dir.path().join("portfolio.csv");
    std::fs::write(&csv_path, CSV).unwrap();
    portfolio_import::seed_if_empty(&db.pool, &csv_path)
        .await
        .unwrap();

    let (status, body) = send(&app, request("GET", "/api/portfolio", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let items = body["data"].as_array().unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Palette Tool", "Old Reel", "Undated Sketch"]);

    let first = &items[0];
    assert!(first["id"].is_i64());
    assert_eq!(first["type"], "tool");
    assert_eq!(first["date"], "07/2025");
    assert_eq!(first["url"], "https://example.com/palette");

    let id = first["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        request("GET", &format!("/api/portfolio/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Palette Tool");
}

#[tokio::test]
async fn csv_import_requires_auth_and_headers() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let csv_request = |user: Option<&str>, csv: &str| {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/portfolio/import")
            .header(header::CONTENT_TYPE, "text/csv");
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        builder.body(Body::from(csv.to_string())).unwrap()
    };

    let (status, _) = send(&app, csv_request(None, CSV)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, csv_request(Some("owner"), "title,date\nA,2020\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("url"));

    let (status, body) = send(&app, csv_request(Some("owner"), CSV)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn portfolio_edits_need_a_valid_token() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;
    let draft = json!({ "title": "Zine", "type": "art", "date": "2023-05" });

    let (status, _) = send(&app, request("POST", "/api/portfolio", None, Some(draft.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = Request::builder()
        .method("POST")
        .uri("/api/portfolio")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(draft.to_string()))
        .unwrap();
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&app, request("POST", "/api/portfolio", Some("owner"), Some(draft))).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/portfolio/{id}"),
            Some("owner"),
            Some(json!({ "description": "Risograph print" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Zine");
    assert_eq!(body["data"]["description"], "Risograph print");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/portfolio/{id}"), Some("owner"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/portfolio/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn links_are_private_to_their_owner() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/links",
            Some("alice"),
            Some(json!({ "title": "Shop", "url": "https://example.com/shop" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, request("GET", "/api/links", Some("bob"), None)).await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/links/{id}"),
            Some("bob"),
            Some(json!({ "title": "Mine now" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request("POST", "/api/links", Some("alice"), Some(json!({ "title": " ", "url": "x" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/links/{id}"), Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn background_removal_job_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/background-removal/jobs",
            Some("alice"),
            Some(json!({ "file_name": "cat.png" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/background-removal/jobs/{id}");

    let (status, _) = send(
        &app,
        request("PATCH", &uri, Some("alice"), Some(json!({ "status": "failed" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some("alice"),
            Some(json!({ "status": "completed", "result_url": "https://cdn.example.com/cat.png" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = send(&app, request("GET", "/api/account/items", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["type"], "background_removal_job");
    assert_eq!(body["data"][0]["summary"]["title"], "cat.png");
}

#[tokio::test]
async fn palettes_reject_malformed_colors() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/color-palettes",
            Some("alice"),
            Some(json!({ "name": "Bad", "colors": ["red"], "source_file_name": null })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/color-palettes",
            Some("alice"),
            Some(json!({ "name": "Dusk", "colors": ["#112233", "#fff"], "source_file_name": "dusk.jpg" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["colors"], json!(["#112233", "#fff"]));
}

#[tokio::test]
async fn assistant_without_provider_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assistant/chat",
            Some("alice"),
            Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn media_insight_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let cache = AnalysisCache::new(StoreLocation::Directory(dir.path().to_path_buf())).unwrap();
    let analysis = Analysis {
        summary: "A cat on a windowsill.".to_string(),
        tags: vec!["cat".to_string()],
    };
    let body = json!({
        "file_name": "cat.jpg",
        "mime_type": "image/jpeg",
        "description": "",
        "last_modified": 1_000
    });
    let key = serde_json::from_value::<AnalyzeMediaRequest>(body.clone())
        .unwrap()
        .cache_key("alice");
    cache
        .put(&key, "cat.jpg", &analysis, Some(1_000))
        .await
        .unwrap();

    let (status, response) = send(
        &app,
        request("POST", "/api/media-insights/analyze", Some("alice"), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["cached"], true);
    assert_eq!(response["data"]["summary"], "A cat on a windowsill.");

    // A newer source file invalidates the entry; with no provider that is a 503.
    let body = json!({
        "file_name": "cat.jpg",
        "mime_type": "image/jpeg",
        "description": "",
        "last_modified": 2_000
    });
    let (status, _) = send(
        &app,
        request("POST", "/api/media-insights/analyze", Some("alice"), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn media_insight_cache_is_not_shared_between_users() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = test_app(dir.path()).await;

    let body = json!({
        "file_name": "IMG_0001.jpg",
        "mime_type": "image/jpeg",
        "description": "a sunset over the sea"
    });
    let key = serde_json::from_value::<AnalyzeMediaRequest>(body.clone())
        .unwrap()
        .cache_key("alice");
    let cache = AnalysisCache::new(StoreLocation::Directory(dir.path().to_path_buf())).unwrap();
    cache
        .put(
            &key,
            "IMG_0001.jpg",
            &Analysis {
                summary: "Alice's photo".to_string(),
                tags: vec![],
            },
            None,
        )
        .await
        .unwrap();

    let (status, response) = send(
        &app,
        request("POST", "/api/media-insights/analyze", Some("alice"), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["summary"], "Alice's photo");

    // Bob misses and, with no provider configured, gets a 503 instead of Alice's entry.
    let (status, response) = send(
        &app,
        request("POST", "/api/media-insights/analyze", Some("bob"), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response["data"].is_null());
}
