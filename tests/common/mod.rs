//! Shared helpers for the HTTP integration tests.
//!
//! Every test builds a fresh router over an empty store so tests never see
//! each other's data.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roster_api::api::{AppState, create_application, create_router};
use roster_api::infrastructure::{CorsOrigins, Repositories, SqliteStore};

/// Storage backend a test runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    InMemory,
    Sqlite,
}

/// Creates a router backed by the in-memory store.
pub fn in_memory_router() -> Router {
    create_router(AppState::from_repositories(Repositories::in_memory()))
}

/// Creates a router backed by a private `sqlite::memory:` database.
pub async fn sqlite_router() -> Router {
    let store = SqliteStore::connect_in_memory()
        .await
        .expect("in-memory SQLite database");
    create_router(AppState::from_repositories(Repositories::from_sqlite(
        &store,
    )))
}

/// Creates a router for `backend`.
pub async fn router(backend: Backend) -> Router {
    match backend {
        Backend::InMemory => in_memory_router(),
        Backend::Sqlite => sqlite_router().await,
    }
}

/// Creates the full application (tracing + CORS) over the in-memory store.
pub fn application(origins: &CorsOrigins) -> Router {
    create_application(
        AppState::from_repositories(Repositories::in_memory()),
        origins,
    )
}

/// Sends one request and returns the status with the decoded JSON body.
///
/// An empty body decodes to `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Sends a raw body string with a JSON content type.
pub async fn send_raw(router: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}

pub async fn put(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::PUT, uri, Some(body)).await
}

pub async fn patch(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::DELETE, uri, None).await
}

/// Creates a role and returns its id.
pub async fn create_role(router: &Router, role_name: &str) -> i64 {
    let (status, body) = post(router, "/roles", json!({ "role_name": role_name })).await;
    assert_eq!(status, StatusCode::OK, "creating role {role_name}: {body}");
    body["role_id"].as_i64().unwrap()
}

/// A valid user creation payload.
pub fn user_payload(email: &str, role_id: i64) -> Value {
    json!({
        "first_name": "Test",
        "last_name": "User",
        "email": email,
        "hire_date": "2025-01-01",
        "role_id": role_id,
    })
}

/// Creates a user and returns its id.
pub async fn create_user(router: &Router, email: &str, role_id: i64) -> i64 {
    let (status, body) = post(router, "/users", user_payload(email, role_id)).await;
    assert_eq!(status, StatusCode::OK, "creating user {email}: {body}");
    body["user_id"].as_i64().unwrap()
}

/// A valid task creation payload.
pub fn task_payload(description: &str, role_id: i64) -> Value {
    json!({
        "role_id": role_id,
        "task_description": description,
        "completion_timeline": "2025-12-31",
    })
}

/// Creates a task and returns its id.
pub async fn create_task(router: &Router, description: &str, role_id: i64) -> i64 {
    let (status, body) = post(router, "/tasks", task_payload(description, role_id)).await;
    assert_eq!(status, StatusCode::OK, "creating task: {body}");
    body["task_id"].as_i64().unwrap()
}
