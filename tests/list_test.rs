use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use media_server::config::ServerConfig;
use media_server::{AppState, create_app};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_root(dir.path());
    config.default_page = 1;
    config.default_size = 10;
    let app = create_app(AppState::new(config));
    (dir, app)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

fn names(json: &Value) -> Vec<String> {
    json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_files() {
    let (dir, app) = setup_app();
    std::fs::File::create(dir.path().join("list.txt")).unwrap();
    std::fs::write(dir.path().join("list1.txt"), b"12345").unwrap();

    let (status, json) = get(&app, "/list").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&json), vec!["list.txt", "list1.txt"]);
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["size"], 10);
    assert_eq!(json["files"][1]["size"], 5);
    assert_eq!(json["files"][1]["content_type"], "text/plain; charset=utf-8");
    assert!(json["files"][0]["modified"].is_string());
}

#[tokio::test]
async fn test_list_empty_directory() {
    let (_dir, app) = setup_app();

    let (status, json) = get(&app, "/list").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["files"].as_array().unwrap().is_empty());
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_list_pagination_is_stable() {
    let (dir, app) = setup_app();
    for name in ["e.txt", "c.txt", "a.txt", "d.txt", "b.txt"] {
        std::fs::File::create(dir.path().join(name)).unwrap();
    }

    let (_, json) = get(&app, "/list?page=1&size=2").await;
    assert_eq!(names(&json), vec!["a.txt", "b.txt"]);

    let (_, json) = get(&app, "/list?page=2&size=2").await;
    assert_eq!(names(&json), vec!["c.txt", "d.txt"]);
    assert_eq!(json["total"], 5);

    let (_, json) = get(&app, "/list?page=3&size=2").await;
    assert_eq!(names(&json), vec!["e.txt"]);

    // Past the end is an empty page, not an error
    let (status, json) = get(&app, "/list?page=4&size=2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&json).is_empty());
}

#[tokio::test]
async fn test_list_skips_directories() {
    let (dir, app) = setup_app();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::File::create(dir.path().join("nested").join("inner.txt")).unwrap();
    std::fs::File::create(dir.path().join("top.txt")).unwrap();

    let (_, json) = get(&app, "/list").await;
    assert_eq!(names(&json), vec!["top.txt"]);
}

#[tokio::test]
async fn test_list_invalid_parameters() {
    let (_dir, app) = setup_app();

    let (status, _) = get(&app, "/list?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/list?size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(&app, "/list?size=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_list_method_not_allowed() {
    let (_dir, app) = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/list")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
