//! Integration tests for the HTTP preview API
//!
//! Tests every endpoint against one shared router

use avatar_behavior::config::BehaviorConfig;
use avatar_behavior::core::create_router;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_router() -> axum::Router {
    create_router(BehaviorConfig::default())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["state"], "idle");
    assert_eq!(json["clock_ms"], 0.0);
}

#[tokio::test]
async fn test_analyze_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/analyze", Some(json!({"text": "How are you?"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["question_segments"].as_array().unwrap().len(), 1);
    assert_eq!(json["question_segments"][0]["question_type"], "wh_question");

    // Analysis alone never starts anything
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["state"], "idle");
}

#[tokio::test]
async fn test_timeline_is_repeatable() {
    let app = create_test_router();
    let body = json!({"text": "Thank you very much", "duration_ms": 1500.0});
    let (status, first) = send(&app, "POST", "/timeline", Some(body.clone())).await;
    let (_, second) = send(&app, "POST", "/timeline", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["total_duration_ms"], 1500.0);
    assert!(!first["segments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_timeline_rejects_negative_duration() {
    let app = create_test_router();
    let (status, _) = send(&app, "POST", "/timeline", Some(json!({"text": "hi", "duration_ms": -5.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plan_then_tick() {
    let app = create_test_router();
    let (status, json) = send(
        &app,
        "POST",
        "/plan",
        Some(json!({"text": "This is VERY important!", "context": {"emphasis_level": "high"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // The emphasis brow raise puts the avatar in the questioning state
    assert_eq!(json["state"], "questioning");
    assert_eq!(json["submitted"], true);
    assert!(!json["plan"]["gestures"].as_array().unwrap().is_empty());

    let (status, frame) = send(&app, "POST", "/tick", Some(json!({"delta_ms": 16.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(frame["clock_ms"], 16.0);
    assert_eq!(frame["lip_sync_active"], true);
}

#[tokio::test]
async fn test_tick_rejects_negative_delta() {
    let app = create_test_router();
    let (status, _) = send(&app, "POST", "/tick", Some(json!({"delta_ms": -1.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plan_rejects_bad_context() {
    let app = create_test_router();
    let (status, _) = send(
        &app,
        "POST",
        "/plan",
        Some(json!({"text": "Hello", "context": {"language": "not a language!"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let app = create_test_router();
    let (status, current) = send(&app, "GET", "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["enable_gestures"], true);

    let (status, json) = send(&app, "PUT", "/settings", Some(json!({"enable_gestures": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["applied"], true);
    assert_eq!(json["settings"]["enable_gestures"], false);
    assert!(json["pending"].is_null());

    let (_, plan) = send(&app, "POST", "/plan", Some(json!({"text": "This is VERY important!"}))).await;
    assert!(plan["plan"]["gestures"].as_array().unwrap().is_empty());
    assert!(!plan["alternatives"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_audit_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/audit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["compliant"], true);
    assert_eq!(json["wcag_level"], "AAA");

    send(&app, "PUT", "/settings", Some(json!({"enable_gestures": false, "alternative_methods": {}}))).await;
    let (_, json) = send(&app, "GET", "/audit", None).await;
    assert_eq!(json["compliant"], false);
}
