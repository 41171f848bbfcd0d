//! Test utilities and common setup.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use cloudguard::api::{self, AppState};
use cloudguard::auth::{AuthConfig, AuthState};
use cloudguard::db::Database;
use cloudguard::user::{UserRepository, UserService};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Lowest cost bcrypt accepts; keeps the suite fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Create a test AuthConfig with a JWT secret for testing.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        bcrypt_cost: TEST_BCRYPT_COST,
        ..Default::default()
    }
}

/// Router over a fresh in-memory database.
pub async fn test_app() -> Router {
    test_app_with_config(test_auth_config()).await
}

pub async fn test_app_with_config(config: AuthConfig) -> Router {
    let database = Database::in_memory()
        .await
        .expect("Failed to create test database");

    let auth = AuthState::new(config);
    let users = UserService::new(
        Arc::new(UserRepository::new(database.pool().clone())),
        auth.bcrypt_cost(),
    );

    api::create_router(AppState::new(users, auth))
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Register an account and return its token.
pub async fn register(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/register",
            &serde_json::json!({
                "username": username,
                "password": password,
                "fullName": "Test User",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), 201, "registration of {username} failed");

    body_json(response).await["token"]
        .as_str()
        .expect("token in registration response")
        .to_string()
}
