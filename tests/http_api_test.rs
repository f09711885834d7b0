//! HTTP surface driven through the router without a socket

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use freefall::api::{build_app, AppState, ServerSettings};
use freefall::games::seed_chain::{derive_base, OsSeedSource};
use freefall::{GameConfig, InMemorySessionStore, SessionRoundManager};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let manager = SessionRoundManager::new(
        Arc::new(GameConfig::default()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(OsSeedSource),
    );
    build_app(Arc::new(AppState::new(Arc::new(manager))), &ServerSettings::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_and_config() {
    let app = app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["betting"]["min_bet"], 100_000);
    assert_eq!(body["plan_mode"], "geometric");

    let (status, body) = send(&app, "GET", "/api/rtp", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["compliant"], true);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn test_session_play_settle_and_reveal() {
    let app = app();

    let (status, session) = send(&app, "POST", "/api/session", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();
    let client_seed = session["client_seed"].as_str().unwrap().to_string();
    assert_eq!(session["server_seed_hash"].as_str().unwrap().len(), 64);
    assert!(session.get("server_seed").is_none());

    let (status, played) = send(
        &app,
        "POST",
        "/api/play",
        Some(json!({ "session_token": token, "bet": 1_000_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let round_id = played["round_id"].as_str().unwrap().to_string();
    let nonce = played["nonce"].as_u64().unwrap();
    assert_eq!(played["plan"]["form"], "geometric");

    let (status, round) = send(&app, "GET", &format!("/api/session/{}/round/{}", token, round_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["status"], "active");

    let end_round = json!({ "session_token": token, "round_id": round_id });
    let (status, settled) = send(&app, "POST", "/api/round/end", Some(end_round.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["status"], "completed");

    let (status, err) = send(&app, "POST", "/api/round/end", Some(end_round)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "ROUND_COMPLETED");
    assert!(err["request_id"].is_string());

    let (status, reveal) = send(&app, "POST", &format!("/api/session/{}/end", token), None).await;
    assert_eq!(status, StatusCode::OK);
    let server_seed = reveal["server_seed"].as_str().unwrap().to_string();

    let base = derive_base(&server_seed, &client_seed, nonce);
    let (status, verified) = send(
        &app,
        "POST",
        "/api/verify",
        Some(json!({
            "server_seed": server_seed,
            "client_seed": client_seed,
            "nonce": nonce,
            "expected_value": base,
            "server_seed_hash": session["server_seed_hash"],
            "bet": 1_000_000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["valid"], true);
    assert_eq!(verified["commitment_valid"], true);
    assert_eq!(verified["outcome"]["payout"], played["outcome"]["payout"]);

    let (status, err) = send(&app, "GET", &format!("/api/session/{}", token), None).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(err["error"]["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();

    let (status, err) = send(&app, "GET", "/api/session/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "INVALID_SESSION");

    let (_, session) = send(&app, "POST", "/api/session", None).await;
    let token = session["token"].as_str().unwrap();

    let (status, err) = send(
        &app,
        "POST",
        "/api/play",
        Some(json!({ "session_token": token, "bet": 100_010_000u64 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "INVALID_BET");

    let (status, err) = send(&app, "POST", "/api/play", Some(json!({ "bet": "lots" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "BAD_REQUEST");

    let (status, err) = send(
        &app,
        "POST",
        "/api/session",
        Some(json!({ "client_seed": "not hex at all" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "INVALID_SEED");
}

#[tokio::test]
async fn test_verify_rejects_wrong_value() {
    let app = app();
    let server_seed = "42".repeat(32);
    let base = derive_base(&server_seed, "abcdefabcdefabcd", 3);

    let (status, body) = send(
        &app,
        "POST",
        "/api/verify",
        Some(json!({
            "server_seed": server_seed,
            "client_seed": "abcdefabcdefabcd",
            "nonce": 3,
            "claimed_value": base - 0.01,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert!((body["computed_value"].as_f64().unwrap() - base).abs() < 1e-12);
}
