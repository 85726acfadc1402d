mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::fixtures::compact_session_body;
use common::http::{create_session, request, response_json};

#[tokio::test]
async fn it_health_live_and_ready() {
    let app = spawn_test_app();

    let live = request(&app.app, Method::GET, "/health/live", None).await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = request(&app.app, Method::GET, "/health/ready", None).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn it_health_reports_session_counts() {
    let app = spawn_test_app();
    create_session(&app.app, Some(compact_session_body())).await;

    let resp = request(&app.app, Method::GET, "/health", None).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"]["active"], 1);
    assert_eq!(body["sessions"]["max"], app.config.limits.max_sessions);
    assert_eq!(body["sseConnections"], 0);
}

#[tokio::test]
async fn it_unknown_route_is_json_404() {
    let app = spawn_test_app();

    let resp = request(&app.app, Method::GET, "/nope", None).await;
    let (status, headers, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(headers.contains_key("x-request-id"));
    assert!(body["traceId"].is_string());
}
