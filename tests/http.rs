use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use seating_solver::data::SeatingOutput;
use seating_solver::server::router;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn post_json(body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/seating/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_responds() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn generates_seating() {
    let (status, body) = post_json(json!({
        "sessionId": "2025-06-02-AM",
        "students": [
            {"id": 1, "year": 1, "branch": "CSE", "section": "A", "subject": "MATH"},
            {"id": 2, "year": 1, "branch": "CSE", "section": "A", "subject": "MATH"},
            {"id": 3, "year": 2, "branch": "ECE", "section": "B", "subject": "PHY"}
        ],
        "relationships": [{"studentA": 3, "studentB": 1, "kind": "relative"}],
        "rooms": [{"id": 10, "capacity": 6, "columns": 3, "rows": 2}]
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    let output: SeatingOutput = serde_json::from_slice(&body).unwrap();
    assert_eq!(output.assignments.len(), 3);
    assert!(output.warnings.is_empty());
    assert_eq!(output.stats.rooms_used, 1);
}

#[tokio::test]
async fn infeasible_input_is_unprocessable() {
    let (status, body) = post_json(json!({
        "students": [
            {"id": 1, "year": 1, "branch": "CSE", "section": "", "subject": "A"},
            {"id": 2, "year": 1, "branch": "CSE", "section": "", "subject": "B"},
            {"id": 3, "year": 1, "branch": "CSE", "section": "", "subject": "C"}
        ],
        "rooms": [{"id": 1, "capacity": 2, "columns": 2, "rows": 1}]
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["kind"], "infeasible_assignment");
}

#[tokio::test]
async fn missing_rooms_is_a_bad_request() {
    let (status, body) = post_json(json!({"students": [], "rooms": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["kind"], "configuration");
}
