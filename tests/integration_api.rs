//! API Integration Tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use casino_transactions::store::{StoreError, TransactionStore};
use casino_transactions::{Amount, Transaction, TransactionFilter, TransactionType};

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn tx_at(id: &str, user: &str, t: TransactionType, amount: u64, secs: i64) -> Transaction {
    Transaction {
        id: id.to_string(),
        user_id: user.to_string(),
        transaction_type: t,
        amount: Amount::new(amount).unwrap(),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs),
    }
}

fn ids(json: &Value) -> Vec<String> {
    json["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = common::test_app();

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_create_then_query_user() {
    let app = common::test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/transactions",
            json!({"id": "t1", "user_id": "u1", "transaction_type": "bet", "amount": 100}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["id"], "t1");
    assert_eq!(created["user_id"], "u1");
    assert_eq!(created["transaction_type"], "bet");
    assert_eq!(created["amount"], 100);
    assert!(chrono::DateTime::parse_from_rfc3339(created["timestamp"].as_str().unwrap()).is_ok());

    let response = app
        .router
        .clone()
        .oneshot(get("/transactions/user?user_id=u1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(ids(&listed), vec!["t1"]);
}

#[tokio::test]
async fn test_create_without_id_generates_one() {
    let app = common::test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/transactions",
            json!({"user_id": "u1", "transaction_type": "win", "amount": 7}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(uuid::Uuid::parse_str(created["id"].as_str().unwrap()).is_ok());
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_duplicate_id_conflicts() {
    let app = common::test_app();
    let body = json!({"id": "t1", "user_id": "u1", "transaction_type": "bet", "amount": 100});

    let first = app.router.clone().oneshot(post_json("/transactions", body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.router.clone().oneshot(post_json("/transactions", body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error = body_json(second).await;
    assert_eq!(error["error_code"], "already_exists");
    assert_eq!(error["details"], "t1");

    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_invalid_transactions_rejected() {
    let app = common::test_app();

    let zero = app
        .router
        .clone()
        .oneshot(post_json(
            "/transactions",
            json!({"id": "t1", "user_id": "u1", "transaction_type": "bet", "amount": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(zero).await["error_code"], "invalid_amount");

    let jackpot = app
        .router
        .clone()
        .oneshot(post_json(
            "/transactions",
            json!({"id": "t2", "user_id": "u1", "transaction_type": "jackpot", "amount": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(jackpot.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(jackpot).await["error_code"], "invalid_transaction_type");

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_list_all_filtered_most_recent_first() {
    let app = common::test_app();
    app.store.save(&tx_at("t1", "u1", TransactionType::Bet, 100, 1)).await.unwrap();
    app.store.save(&tx_at("t2", "u2", TransactionType::Win, 200, 2)).await.unwrap();
    app.store.save(&tx_at("t3", "u1", TransactionType::Win, 50, 3)).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/transactions?transaction_type=win"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ids(&body_json(response).await), vec!["t3", "t2"]);

    // Empty type means no filter
    let response = app
        .router
        .clone()
        .oneshot(get("/transactions?transaction_type="))
        .await
        .unwrap();
    assert_eq!(ids(&body_json(response).await), vec!["t3", "t2", "t1"]);
}

#[tokio::test]
async fn test_list_user_scoped_and_filtered() {
    let app = common::test_app();
    app.store.save(&tx_at("t1", "u1", TransactionType::Bet, 100, 1)).await.unwrap();
    app.store.save(&tx_at("t2", "u2", TransactionType::Bet, 200, 2)).await.unwrap();
    app.store.save(&tx_at("t3", "u1", TransactionType::Win, 50, 3)).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/transactions/user?user_id=u1&transaction_type=bet"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(ids(&json), vec!["t1"]);
    assert_eq!(json["transactions"][0]["timestamp"], "2026-01-01T00:00:01Z");

    let response = app
        .router
        .clone()
        .oneshot(get("/transactions/user?user_id=nobody"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(ids(&body_json(response).await).is_empty());
}

#[tokio::test]
async fn test_padded_user_id_is_queryable() {
    let app = common::test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/transactions",
            json!({"id": "t1", "user_id": " u1 ", "transaction_type": "bet", "amount": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user_id"], "u1");

    for uri in ["/transactions/user?user_id=u1", "/transactions/user?user_id=%20u1%20"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(ids(&body_json(response).await), vec!["t1"], "{uri}");
    }
}

#[tokio::test]
async fn test_list_user_requires_user_id() {
    let app = common::test_app();

    for uri in ["/transactions/user", "/transactions/user?user_id=", "/transactions/user?user_id=%20"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["error_code"], "invalid_request");
    }
}

#[tokio::test]
async fn test_unknown_filter_type_rejected() {
    let app = common::test_app();

    let response = app
        .router
        .clone()
        .oneshot(get("/transactions?transaction_type=jackpot"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_assigned_and_echoed() {
    let app = common::test_app();

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    let generated = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_requests_are_logged() {
    let app = common::test_app();

    let request = Request::builder()
        .uri("/transactions")
        .header("x-request-id", "req-7")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logs = app.flush_logs().await;
    let entries = logs.entries();
    let started = entries
        .iter()
        .find(|e| e.message == "Request started: GET /transactions")
        .expect("start entry");
    let completed = entries
        .iter()
        .find(|e| e.message == "Request completed: GET /transactions")
        .expect("completion entry");

    assert_eq!(started.field("request_id"), Some("req-7"));
    assert_eq!(completed.field("status"), Some("200"));
    assert_eq!(&*completed.app_name, "test-app");
}

/// Store whose backend is unreachable
struct UnreachableStore;

#[async_trait]
impl TransactionStore for UnreachableStore {
    async fn save(&self, _: &Transaction) -> Result<(), StoreError> {
        Err(StoreError::Connectivity("connection refused".into()))
    }
    async fn get_by_id(&self, _: &str) -> Result<Option<Transaction>, StoreError> {
        Err(StoreError::Connectivity("connection refused".into()))
    }
    async fn get_by_user(&self, _: &str, _: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        Err(StoreError::Connectivity("connection refused".into()))
    }
    async fn get_all(&self, _: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        Err(StoreError::Connectivity("connection refused".into()))
    }
}

#[tokio::test]
async fn test_unreachable_store_is_service_unavailable() {
    let (router, _logs, _guard) = common::app_over(Arc::new(UnreachableStore));

    let response = router.clone().oneshot(get("/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = router
        .oneshot(post_json(
            "/transactions",
            json!({"user_id": "u1", "transaction_type": "bet", "amount": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error_code"], "store_unavailable");
}
