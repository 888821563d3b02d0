//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use slidecast::api;
use slidecast::config::{HubConfig, ServerConfig};
use slidecast::db::Database;
use slidecast::ws::RoomHub;
use tower::ServiceExt;

/// A router over a fresh in-memory database, plus the hub behind it.
pub struct TestApp {
    pub router: Router,
    pub hub: RoomHub,
}

/// Create a test application with all services initialized.
pub async fn test_app() -> TestApp {
    test_app_with_hub(HubConfig::default()).await
}

pub async fn test_app_with_hub(hub_config: HubConfig) -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let (hub, _task) = RoomHub::spawn(&hub_config);
    let state = api::AppState::new(db, hub.clone(), hub_config, &ServerConfig::default());
    TestApp {
        router: api::create_router(state),
        hub,
    }
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Create a presentation and return its id.
pub async fn create_presentation(app: &TestApp, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/presentation/create",
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Create a poll slide and return the created slide JSON.
pub async fn create_poll(app: &TestApp, presentation_id: i64, options: &[&str]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/presentation/{presentation_id}/slide/create"),
        Some(serde_json::json!({
            "type": 1,
            "content": { "title": "Poll", "options": options }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}
