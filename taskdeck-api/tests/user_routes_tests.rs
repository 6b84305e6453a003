//! Route tests for signup and login.

mod support;

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use support::{json_request, TestApp};
use taskdeck_core::USERS_TABLE;
use taskdeck_storage::{FailureMode, StoreOp};

#[tokio::test]
async fn test_signup_login_and_use_key() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/signup",
            Some(json!({"username": "alice_1", "password": "secret-pw"})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!("user created!"));

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/login",
            Some(json!({"username": "alice_1", "password": "secret-pw"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let api_key = body.as_str().expect("api key string").to_string();
    assert!(!api_key.is_empty());

    let mut request = json_request(Method::GET, "/tasks", None);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", api_key).parse().unwrap(),
    );
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let users = app.store.records(USERS_TABLE).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_ne!(users[0]["passwordHash"], json!("secret-pw"));
}

#[tokio::test]
async fn test_signup_rejects_short_and_duplicate() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/signup",
            Some(json!({"username": "bob", "password": "secret-pw"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    app.seed_user("bobby_1").await;
    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/signup",
            Some(json!({"username": "bobby_1", "password": "secret-pw"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new();
    app.seed_user("alice_1").await;

    for credentials in [
        json!({"username": "alice_1", "password": "wrong-password"}),
        json!({"username": "nobody", "password": "password-1"}),
    ] {
        let (status, body) = app
            .send(json_request(Method::POST, "/login", Some(credentials)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Wrong password or username !!!");
    }

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/login",
            Some(json!({"username": "a", "password": "b"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request(Method::POST, "/login", Some(json!({"username": 7}))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_seeded_login_returns_seeded_key() {
    let app = TestApp::new();
    let alice = app.seed_user("alice_1").await;
    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/login",
            Some(json!({"username": "alice_1", "password": "password-1"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(alice.api_key));
}

#[tokio::test]
async fn test_identity_store_outage_is_not_unauthorized() {
    let app = TestApp::new();
    let alice = app.seed_user("alice_1").await;
    app.store.fail(StoreOp::QueryIndex, FailureMode::Unavailable).await;

    let (status, _) = app.list(&alice).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
