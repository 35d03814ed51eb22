mod common;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use common::{json_body, TestApp};

#[allow(dead_code)]
fn assert_app_state_bounds() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<storefront_api::AppState>();
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app.get("/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc: Value = json_body(response).await;
    assert_eq!(doc["info"]["title"], "Storefront API");
    assert!(doc["paths"]["/api/v1/products/stats"]["get"].is_object());
    assert!(doc["paths"]["/api/v1/categories/{id}"]["delete"].is_object());
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let app = TestApp::new().await;
    let first = app.get("/api/v1/products").await;
    let second = app.get("/api/v1/products").await;

    let a = first.headers()["x-request-id"].to_str().unwrap().to_string();
    let b = second.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!a.is_empty());
    assert_ne!(a, b);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some(app.admin_token()))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
