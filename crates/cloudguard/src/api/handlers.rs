//! API request handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode, Uri, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::{
    AuthError, AuthState, CurrentUser, IssuedToken, clear_session_cookie, connection_is_encrypted,
    session_cookie,
};
use crate::user::{RegisterRequest, User, UserInfo};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by login and registration.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserInfo,
}

type SessionParts = (AppendHeaders<[(HeaderName, String); 1]>, Json<SessionResponse>);

/// Issue a token for `user` and build the `Set-Cookie` header and body carrying it.
fn start_session(
    auth: &AuthState,
    headers: &HeaderMap,
    uri: &Uri,
    user: User,
) -> Result<SessionParts, AuthError> {
    let IssuedToken { token, expires_at } = auth.issue_token(user.id, &user.username)?;
    let secure = connection_is_encrypted(headers, uri, auth.trust_forwarded_proto());
    let cookie = session_cookie(&token, expires_at, secure);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(SessionResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Login endpoint.
#[instrument(skip_all, fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .verify_credentials(&request.username, &request.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let user_id = user.id;
    let session = start_session(&state.auth, &headers, &uri, user)?;

    info!(user_id, "User logged in successfully");

    Ok(session)
}

/// Registration endpoint.
#[instrument(skip_all, fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.register(request).await?;
    let (cookie, body) = start_session(&state.auth, &headers, &uri, user)?;

    Ok((StatusCode::CREATED, cookie, body))
}

/// Logout endpoint.
///
/// Clears the session cookie. A bearer copy of the token stays valid until it expires.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    uri: Uri,
) -> impl IntoResponse {
    let secure = connection_is_encrypted(&headers, &uri, state.auth.trust_forwarded_proto());
    info!("User logged out");

    (
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, clear_session_cookie(secure))]),
    )
}

/// Get the account behind the current session, re-read from the store.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn get_current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<UserInfo>> {
    let account = state
        .users
        .get_user(user.id())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", user.id())))?;

    Ok(Json(account.into()))
}
