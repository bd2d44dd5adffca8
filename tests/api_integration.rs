//! End-to-end ledger node API tests
//!
//! These tests drive the axum router directly (no socket) over an
//! in-memory ledger and verify:
//! - Bearer tokens identify the submitting drone
//! - Contract rejections come back as 409 with the contract's reason
//! - Calls work with and without a caller
//! - Requests for another contract address are refused

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use swarm_formation::api::{router, AppState};
use swarm_formation::auth::jwt::create_token;
use swarm_formation::domain::drone::DroneId;
use swarm_formation::infrastructure::ledger::InMemoryLedger;
use tower::util::ServiceExt; // for oneshot

const ADDRESS: &str = "0xswarm";
const SECRET: &str = "api-test-secret";

/// Setup test application over a fresh contract led by drone 0
fn setup_app() -> Router {
    let ledger = Arc::new(InMemoryLedger::deploy(DroneId(0), 3, Duration::seconds(30)));
    router(AppState::new(ledger, ADDRESS, SECRET))
}

fn bearer(drone: u32) -> String {
    format!("Bearer {}", create_token(DroneId(drone), SECRET).unwrap())
}

fn transaction(drone: u32, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/ledgers/{}/transactions", ADDRESS))
        .header("content-type", "application/json")
        .header("authorization", bearer(drone))
        .body(Body::from(serde_json::to_string(payload).unwrap()))
        .unwrap()
}

fn call(payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/ledgers/{}/calls", ADDRESS))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(payload).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_leader_registers_drone_and_gets_receipt() {
    let app = setup_app();

    let response = app
        .oneshot(transaction(
            0,
            &json!({"function": "addDrone", "args": {"drone": 1}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["function"], "addDrone");
    assert_eq!(json["caller"], 0);
    assert_eq!(json["block_number"], 1);
    assert!(json["tx_hash"].is_string());
}

#[tokio::test]
async fn test_follower_cannot_register_drones() {
    let app = setup_app();

    let response = app
        .oneshot(transaction(
            1,
            &json!({"function": "addDrone", "args": {"drone": 2}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = json_body(response).await;
    assert_eq!(json["error"], "drone-1 is not the leader");
}

#[tokio::test]
async fn test_transaction_without_token_is_unauthorized() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/ledgers/{}/transactions", ADDRESS))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"function":"sendHeartbeat"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let app = setup_app();
    let forged = create_token(DroneId(0), "not-the-node-secret").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/ledgers/{}/transactions", ADDRESS))
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", forged))
                .body(Body::from(r#"{"function":"sendHeartbeat"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_call_without_caller() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(call(&json!({"function": "leader"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, json!({"kind": "leader", "value": 0}));

    let response = app
        .oneshot(call(&json!({"function": "getAvailablePositions"})))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["value"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_claim_flow_over_http() {
    let app = setup_app();

    for drone in 1..=2 {
        let response = app
            .clone()
            .oneshot(transaction(
                0,
                &json!({"function": "addDrone", "args": {"drone": drone}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Step 1: drone 1 claims slot 2
    let response = app
        .clone()
        .oneshot(transaction(
            1,
            &json!({"function": "assignPosition", "args": {"position": 2}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["events"][0]["type"], "positionAssigned");

    // Step 2: drone 2 loses the race for the same slot
    let response = app
        .clone()
        .oneshot(transaction(
            2,
            &json!({"function": "assignPosition", "args": {"position": 2}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Step 3: the slot is gone from the available set
    let response = app
        .oneshot(call(&json!({"function": "getAvailablePositions"})))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["value"], json!([1, 3]));
}

#[tokio::test]
async fn test_unknown_contract_address_is_not_found() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ledgers/0xother/calls")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"function":"leader"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_mission_is_a_conflict() {
    let app = setup_app();

    let response = app
        .oneshot(call(
            &json!({"function": "getMission", "args": {"mission_id": 9}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = json_body(response).await;
    assert_eq!(json["error"], "mission 9 does not exist");
}
