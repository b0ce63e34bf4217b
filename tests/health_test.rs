mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::Harness;
use relaybox::server::router;
use serde_json::Value;
use tower::ServiceExt;

async fn get_json(h: &Harness, uri: &str) -> (StatusCode, Value) {
    let response = router(h.worker.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_reports_idle_queue() {
    let h = Harness::new();

    let (status, body) = get_json(&h, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["running"], false);
    assert_eq!(body["pending"], 0);
    assert_eq!(body["metrics"]["jobs_delivered"], 0);
}

#[tokio::test]
async fn test_root_serves_same_payload() {
    let h = Harness::new();
    h.enqueue(1, "https://a.example/1");
    h.enqueue(2, "https://a.example/2");

    let (status, body) = get_json(&h, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending"], 2);
    assert_eq!(body["metrics"]["jobs_enqueued"], 2);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let h = Harness::new();

    let response = router(h.worker.clone())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
