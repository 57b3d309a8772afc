//! HTTP API tests
//!
//! Exercises the router in-process through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use dwell_config::parse_config;
use dwell_core::SessionTracker;
use dwell_store::{SqliteStore, Store};
use dwell_util::{Clock, ManualClock, UserId};
use dwelld::api::{AppContext, LEARNER_HEADER, create_router};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const LEARNER: i64 = 7;

struct TestServer {
    app: Router,
    clock: Arc<ManualClock>,
    store: Arc<dyn Store>,
}

fn setup_test_server() -> TestServer {
    let config = parse_config(
        r#"
        config_version = 1

        [[subsections]]
        id = 1
        min_time_seconds = 30
    "#,
    )
    .unwrap();

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
    ));

    let app = create_router(AppContext {
        tracker: Arc::new(SessionTracker::new(&config, store.clone())),
        clock: clock.clone(),
    });

    TestServer { app, clock, store }
}

/// Send a request and decode the JSON body
async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    learner: Option<i64>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(id) = learner {
        request = request.header(LEARNER_HEADER, id.to_string());
    }

    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = setup_test_server();

    let (status, _, body) = make_request(&server.app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version"], 1);
    assert_eq!(body["store_healthy"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_missing_learner_is_unauthorized() {
    let server = setup_test_server();

    let (status, _, body) = make_request(
        &server.app,
        Method::POST,
        "/subsections/progress/1/start",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/subsections/progress/summary")
        .header(LEARNER_HEADER, "not-a-number")
        .body(Body::empty())
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let server = setup_test_server();
    let app = &server.app;

    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/start", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].is_string());
    assert_eq!(body["subsection_id"], 1);
    assert_eq!(body["time_spent_seconds"], 0);
    assert_eq!(body["completion_percentage"], 0.0);

    server.clock.advance_secs(15.0);
    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_spent_seconds"], 15);
    assert_eq!(body["completion_percentage"], 50.0);
    assert_eq!(body["is_completed"], false);
    assert_eq!(body["next_heartbeat_in_seconds"], 15);

    // Too soon: 429 with a retry hint
    server.clock.advance_secs(4.0);
    let (status, headers, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "too_frequent");
    assert_eq!(body["retry_after_seconds"], 6);
    assert_eq!(headers[header::RETRY_AFTER], "6");

    server.clock.advance_secs(12.0);
    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_spent_seconds"], 31);
    assert_eq!(body["is_completed"], true);

    let (status, _, body) =
        make_request(app, Method::GET, "/subsections/progress/1/status", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);
    assert_eq!(body["is_viewed"], true);
    assert_eq!(body["session_active"], true);

    server.clock.advance_secs(10.0);
    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/complete", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_spent_seconds"], 31);
    assert_eq!(body["session_history"][0]["duration_seconds"], 41);
    assert!(body["session_start_at"].is_null());

    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/complete", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "session_not_found");

    let (status, _, body) =
        make_request(app, Method::GET, "/subsections/progress/summary", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], LEARNER);
    assert_eq!(body["total_time_spent_seconds"], 31);
    assert_eq!(body["subsections_completed"], 1);
}

#[tokio::test]
async fn test_not_found_statuses() {
    let server = setup_test_server();
    let app = &server.app;

    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/99/start", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "subsection_not_found");

    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "session_not_found");

    let (status, _, body) =
        make_request(app, Method::GET, "/subsections/progress/1/status", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);
    assert_eq!(body["time_spent_seconds"], 0);
}

#[tokio::test]
async fn test_verification_required_is_forbidden() {
    let server = setup_test_server();
    let app = &server.app;

    make_request(app, Method::POST, "/subsections/progress/1/start", Some(LEARNER)).await;

    let until = server.clock.now() + chrono::Duration::hours(1);
    server
        .store
        .set_verification_until(UserId::new(LEARNER), until)
        .unwrap();

    server.clock.advance_secs(15.0);
    let (status, _, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "verification_required");
    assert!(body.get("retry_after_seconds").is_none());
}

#[tokio::test]
async fn test_rate_limited_has_retry_after() {
    let server = setup_test_server();
    let app = &server.app;

    for _ in 0..4 {
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
        server.clock.advance_secs(1.0);
    }

    let (status, headers, body) =
        make_request(app, Method::POST, "/subsections/progress/1/heartbeat", Some(LEARNER)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");
    assert_eq!(headers[header::RETRY_AFTER], "56");
}

