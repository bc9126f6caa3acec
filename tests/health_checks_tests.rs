mod support;

use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use support::{FailingStore, TestApp};

#[tokio::test]
async fn liveness_endpoint_returns_healthy() {
    // Arrange
    let app = TestApp::new();

    // Act
    let response = app.get("/health").await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    let json: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_number());
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn readiness_reports_store_and_templates() {
    let app = TestApp::new();

    let response = app.get("/ready").await;

    assert_eq!(response.status, StatusCode::OK);
    let json: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["ready"], true);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["components"]["store"]["status"], "healthy");
    assert_eq!(json["components"]["store"]["details"]["backend"], "memory");
    assert_eq!(json["components"]["templates"]["status"], "healthy");
}

#[tokio::test]
async fn readiness_fails_when_the_store_is_unreachable() {
    let app = TestApp::with_store(Arc::new(FailingStore::new(&[])));

    let response = app.get("/ready").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["ready"], false);
    assert_eq!(json["components"]["store"]["status"], "unhealthy");
}

#[tokio::test]
async fn readiness_fails_after_the_store_closes() {
    let app = TestApp::new();
    app.store.close().await.unwrap();

    let response = app.get("/ready").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let liveness = app.get("/health").await;
    assert_eq!(liveness.status, StatusCode::OK);
}
