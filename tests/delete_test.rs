use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use media_server::config::ServerConfig;
use media_server::{AppState, create_app};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup_app() -> (TempDir, PathBuf, Router) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("test_uploads");
    std::fs::create_dir(&root).unwrap();
    let app = create_app(AppState::new(ServerConfig::with_root(&root)));
    (dir, root, app)
}

async fn send(app: &Router, method: &str, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_delete_file() {
    let (_dir, root, app) = setup_app();
    std::fs::File::create(root.join("delete.txt")).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/delete?filename=delete.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
    assert!(!root.join("delete.txt").exists());
}

#[tokio::test]
async fn test_delete_method_not_allowed() {
    let (_dir, root, app) = setup_app();
    std::fs::File::create(root.join("delete.txt")).unwrap();

    let status = send(&app, "GET", "/delete?filename=delete.txt").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(root.join("delete.txt").exists());
}

#[tokio::test]
async fn test_delete_filename_not_provided() {
    let (_dir, _root, app) = setup_app();

    assert_eq!(send(&app, "DELETE", "/delete").await, StatusCode::BAD_REQUEST);
    assert_eq!(
        send(&app, "DELETE", "/delete?filename=").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_delete_file_not_found() {
    let (_dir, _root, app) = setup_app();

    let status = send(&app, "DELETE", "/delete?filename=nonexistent.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_twice() {
    let (_dir, root, app) = setup_app();
    std::fs::write(root.join("once.txt"), b"bye").unwrap();

    let uri = "/delete?filename=once.txt";
    assert_eq!(send(&app, "DELETE", uri).await, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, "DELETE", uri).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_rejects_path_traversal() {
    let (dir, _root, app) = setup_app();
    let outside = dir.path().join("outside.txt");
    std::fs::write(&outside, b"keep me").unwrap();

    let status = send(&app, "DELETE", "/delete?filename=..%2Foutside.txt").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(outside.exists());
}

#[tokio::test]
async fn test_delete_directory_is_not_found() {
    let (_dir, root, app) = setup_app();
    std::fs::create_dir(root.join("folder")).unwrap();

    let status = send(&app, "DELETE", "/delete?filename=folder").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(root.join("folder").is_dir());
}
