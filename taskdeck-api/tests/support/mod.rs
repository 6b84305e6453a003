//! Shared harness for route tests: the full router over an in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskdeck_api::{create_router, ApiConfig, AppState, StoreBackend, StoreConfig};
use taskdeck_core::{User, UserId, USERS_TABLE};
use taskdeck_storage::{user_to_record, CacheConfig, InMemoryStore, StoreClient};
use taskdeck_test_utils::fixtures::user;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::with_default_tables());
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let dyn_store: Arc<dyn StoreClient> = store.clone();
        let state = AppState::new(dyn_store, &config, CacheConfig::default(), ApiConfig::default());
        Self {
            router: create_router(state.clone()),
            state,
            store,
        }
    }

    /// Insert a user directly into the store and return it.
    pub async fn seed_user(&self, username: &str) -> User {
        let api_key = format!("key-{}", username);
        let seeded = user(username, "password-1", &api_key);
        self.store
            .put(USERS_TABLE, user_to_record(&seeded).expect("encode user"))
            .await
            .expect("seed user");
        seeded
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn list(&self, owner: &User) -> (StatusCode, Value) {
        self.send(authed(Method::GET, "/tasks", owner, None)).await
    }

    pub async fn create(&self, owner: &User, body: Value) -> (StatusCode, Value) {
        self.send(authed(Method::POST, "/task", owner, Some(body))).await
    }

    pub async fn cached_count(&self, user_id: UserId) -> usize {
        self.state.tasks.cache().get_all(user_id).await.len()
    }
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn authed(method: Method, uri: &str, owner: &User, body: Option<Value>) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", owner.api_key).parse().expect("header"),
    );
    request
}

/// Tasks in a list response, sorted by title.
pub fn titles(body: &Value) -> Vec<String> {
    let mut titles: Vec<String> = body
        .as_array()
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|t| t["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    titles.sort();
    titles
}
