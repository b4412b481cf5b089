//! HTTP behaviour of the coordinator, driven in-process through the router

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use hellopi::common::tracing_middleware::REQUEST_ID_HEADER;
use hellopi::coordinator::http::{create_router, CoordState};
use hellopi::coordinator::MessageStore;
use serde_json::Value;
use std::net::SocketAddr;
use tempfile::TempDir;
use tower::ServiceExt;

const PEER: ([u8; 4], u16) = ([10, 0, 0, 42], 40123);

async fn setup() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let store = MessageStore::new(dir.path().join("messages.db"));
    store.initialize().await.unwrap();
    let app = create_router(CoordState { store }).layer(MockConnectInfo(SocketAddr::from(PEER)));
    (dir, app)
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_get_empty_listing() {
    let (_dir, app) = setup().await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.to_lowercase().contains("<!doctype html>"));
    assert!(body.contains("</html>"));
}

#[tokio::test]
async fn test_valid_post_is_listed() {
    let (_dir, app) = setup().await;

    let (status, body) = send(&app, post_form("text=Hello%2C+World%21")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Data received successfully");

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello, World!"));
    assert!(body.contains("10.0.0.42"));
}

#[tokio::test]
async fn test_empty_post() {
    let (_dir, app) = setup().await;

    let (status, body) = send(&app, post_form("text=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Text cannot be empty"));
}

#[tokio::test]
async fn test_whitespace_only_text() {
    let (_dir, app) = setup().await;

    let (status, body) = send(&app, post_form("text=+++%09")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Text cannot be empty"));
}

#[tokio::test]
async fn test_long_post() {
    let (_dir, app) = setup().await;

    let body = format!("text={}", "a".repeat(1001));
    let (status, body) = send(&app, post_form(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Text too long"));

    let body = format!("text={}", "a".repeat(1000));
    let (status, _) = send(&app, post_form(&body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_text_field() {
    let (_dir, app) = setup().await;

    let (status, _) = send(&app, post_form("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_form("name=pi-01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_form_body_is_rejected() {
    let (_dir, app) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text":"pi-01"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Text cannot be empty"));
}

#[tokio::test]
async fn test_oversized_body() {
    let (_dir, app) = setup().await;

    let body = format!("text={}", "a".repeat(32 * 1024));
    let (status, _) = send(&app, post_form(&body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_multiple_posts_newest_first() {
    let (_dir, app) = setup().await;

    for text in ["alpha-pi", "bravo-pi", "charlie-pi"] {
        let (status, _) = send(&app, post_form(&format!("text={}", text))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, get("/")).await;
    let alpha = body.find("alpha-pi").unwrap();
    let bravo = body.find("bravo-pi").unwrap();
    let charlie = body.find("charlie-pi").unwrap();
    assert!(charlie < bravo && bravo < alpha);
}

#[tokio::test]
async fn test_submitted_markup_is_escaped() {
    let (_dir, app) = setup().await;

    let (status, _) = send(&app, post_form("text=%3Cb%3Epi%3C%2Fb%3E")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/")).await;
    assert!(body.contains("&lt;b&gt;pi&lt;/b&gt;"));
    assert!(!body.contains("<b>pi</b>"));
}

#[tokio::test]
async fn test_storage_failure_is_generic() {
    let dir = TempDir::new().unwrap();
    // A directory where the database file should be
    let store = MessageStore::new(dir.path());
    let app = create_router(CoordState { store }).layer(MockConnectInfo(SocketAddr::from(PEER)));

    let (status, body) = send(&app, post_form("text=pi-01")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");

    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_reports_count() {
    let (_dir, app) = setup().await;
    send(&app, post_form("text=pi-01")).await;
    send(&app, post_form("text=pi-02")).await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["messages"], 2);
    assert_eq!(json["version"], hellopi::VERSION);
}

#[tokio::test]
async fn test_request_id_header() {
    let (_dir, app) = setup().await;

    let request = Request::builder()
        .uri("/")
        .header(REQUEST_ID_HEADER, "lab-request-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "lab-request-1"
    );

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
