//! End-to-end exercises of the HTTP surface against the in-memory gateway,
//! covering the literal scenarios and round-trip properties: registration,
//! duplicate-login conflict, order submission idempotence, and the
//! withdrawal boundary.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use gophermart::api::{self, AppState};
use gophermart::db::MemoryGateway;
use gophermart::engine::OrderEngine;

fn extract_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn duplicate_login_yields_exact_conflict_body() {
    let engine = Arc::new(OrderEngine::new(MemoryGateway::new()));
    let state = AppState::new(engine, b"test-secret-key".to_vec());
    let router = api::build(state);

    let body = serde_json::json!({"login": "alice", "password": "p@ss"});
    let make_request = |body: serde_json::Value| {
        Request::builder()
            .method("POST")
            .uri("/api/user/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let first = router.clone().oneshot(make_request(body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router.clone().oneshot(make_request(body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let bytes = second.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, serde_json::json!({"message": "HTTP 409 Login Already Exists"}));
}

#[tokio::test]
async fn order_submission_is_idempotent_and_rejects_other_users() {
    let engine = Arc::new(OrderEngine::new(MemoryGateway::new()));
    let state = AppState::new(engine, b"test-secret-key".to_vec());
    let router = api::build(state);

    let register = |login: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/user/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"login": login, "password": "pw"}).to_string(),
            ))
            .unwrap()
    };

    let alice_resp = router.clone().oneshot(register("alice")).await.unwrap();
    let alice_cookie = extract_cookie(&alice_resp);

    let bob_resp = router.clone().oneshot(register("bob")).await.unwrap();
    let bob_cookie = extract_cookie(&bob_resp);

    let submit = |number: &str, cookie: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/user/orders")
            .header(header::COOKIE, cookie.to_string())
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(number.to_string()))
            .unwrap()
    };

    let first = router.clone().oneshot(submit("12345678903", &alice_cookie)).await.unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = router.clone().oneshot(submit("12345678903", &alice_cookie)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let by_bob = router.clone().oneshot(submit("12345678903", &bob_cookie)).await.unwrap();
    assert_eq!(by_bob.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_luhn_number_is_unprocessable() {
    let engine = Arc::new(OrderEngine::new(MemoryGateway::new()));
    let state = AppState::new(engine, b"test-secret-key".to_vec());
    let router = api::build(state);

    let register = Request::builder()
        .method("POST")
        .uri("/api/user/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"login": "alice", "password": "pw"}).to_string(),
        ))
        .unwrap();
    let resp = router.clone().oneshot(register).await.unwrap();
    let cookie = extract_cookie(&resp);

    let submit = Request::builder()
        .method("POST")
        .uri("/api/user/orders")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("12345678901"))
        .unwrap();
    let resp = router.oneshot(submit).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn withdrawal_boundary_then_insufficient_funds() {
    // Credit the balance through the real pipeline (submit an order, then
    // apply an accrual result) rather than poking the gateway directly, so
    // this exercises the same atomic-credit path the scoring worker uses.
    let engine = Arc::new(OrderEngine::new(MemoryGateway::new()));
    let user_id = engine.register_user("alice", "pw").await.unwrap();
    engine.submit_order(user_id, "12345678903").await.unwrap();
    engine
        .apply_accrual("12345678903", gophermart::domain::OrderStatus::Processed, rust_decimal::Decimal::new(50000, 2))
        .await
        .unwrap();

    let state = AppState::new(Arc::clone(&engine), b"test-secret-key".to_vec());
    let router = api::build(state);

    let login = Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"login": "alice", "password": "pw"}).to_string(),
        ))
        .unwrap();
    let resp = router.clone().oneshot(login).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = extract_cookie(&resp);

    let withdraw = |order: &str, sum: f64, cookie: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/user/balance/withdraw")
            .header(header::COOKIE, cookie.to_string())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"order": order, "sum": sum}).to_string(),
            ))
            .unwrap()
    };

    let exact = router.clone().oneshot(withdraw("2377225624", 500.0, &cookie)).await.unwrap();
    assert_eq!(exact.status(), StatusCode::OK);

    let overdraft = router.oneshot(withdraw("2377225624", 0.01, &cookie)).await.unwrap();
    assert_eq!(overdraft.status(), StatusCode::PAYMENT_REQUIRED);
}
