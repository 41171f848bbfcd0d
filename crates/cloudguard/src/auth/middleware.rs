//! Authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use log::{debug, warn};
use std::sync::Arc;

use super::{
    AuthConfig, AuthError, IssuedToken, Principal, TokenIssuer, TokenVerifier, extract_token,
};

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    issuer: Option<TokenIssuer>,
    verifier: Option<TokenVerifier>,
}

impl AuthState {
    /// Create new auth state from config.
    /// Resolves `env:VAR_NAME` syntax in jwt_secret at construction time.
    pub fn new(mut config: AuthConfig) -> Self {
        let secret = match config.resolve_jwt_secret() {
            Ok(secret) => secret,
            Err(e) => {
                warn!("JWT secret could not be resolved: {e}");
                None
            }
        };
        config.jwt_secret = secret.clone();

        let issuer = secret.as_deref().map(TokenIssuer::new);
        let verifier = secret.as_deref().map(TokenVerifier::new);

        Self {
            config: Arc::new(config),
            issuer,
            verifier,
        }
    }

    /// bcrypt work factor for new password hashes.
    pub fn bcrypt_cost(&self) -> u32 {
        self.config.bcrypt_cost
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    pub fn trust_forwarded_proto(&self) -> bool {
        self.config.trust_forwarded_proto
    }

    /// Issue a session token for an account.
    pub fn issue_token(&self, id: i64, username: &str) -> Result<IssuedToken, AuthError> {
        self.issuer
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?
            .issue(id, username)
    }

    /// Validate a session token.
    pub fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        self.verifier
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?
            .verify(token)
    }
}

/// Authenticated caller extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub principal: Principal,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.principal.id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }
}

/// Read the principal bound by [`auth_middleware`].
///
/// Reaching a handler without one is a wiring bug, so the rejection is a
/// server error rather than a 401.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(|principal| CurrentUser { principal })
            .ok_or(AuthError::PrincipalMissing)
    }
}

/// Authentication middleware.
///
/// Takes the token from the first present source (Authorization header,
/// then the session cookie), verifies it and binds the resulting
/// [`Principal`] to the request. Any failure ends the request with a 401.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = req.uri().path().to_string();

    let principal = extract_token(req.headers())
        .and_then(|(source, token)| {
            debug!("Authenticating {path} via {source}");
            auth.verify_token(token)
        })
        .inspect_err(|e| warn!("Rejected request to {path}: {e}"))?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        middleware,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    fn auth_state() -> AuthState {
        AuthState::new(AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        })
    }

    async fn whoami(user: CurrentUser) -> String {
        format!("{}:{}", user.id(), user.username())
    }

    fn app(auth: AuthState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(auth, auth_middleware))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_missing_secret_is_internal_error() {
        let auth = AuthState::new(AuthConfig::default());
        assert!(matches!(
            auth.issue_token(1, "alice"),
            Err(AuthError::Internal(_))
        ));
        assert!(matches!(
            auth.verify_token("a.b.c"),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn test_issue_and_verify_through_state() {
        let auth = auth_state();
        let issued = auth.issue_token(3, "dave").unwrap();
        let principal = auth.verify_token(&issued.token).unwrap();
        assert_eq!(principal.id, 3);
        assert_eq!(principal.username, "dave");
    }

    #[tokio::test]
    async fn test_bearer_token_binds_principal() {
        let auth = auth_state();
        let issued = auth.issue_token(7, "alice").unwrap();

        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "7:alice");
    }

    #[tokio::test]
    async fn test_session_cookie_binds_principal() {
        let auth = auth_state();
        let issued = auth.issue_token(8, "bob").unwrap();

        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, format!("session={}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "8:bob");
    }

    #[tokio::test]
    async fn test_rejected_header_token_ignores_valid_cookie() {
        let auth = auth_state();
        let issued = auth.issue_token(8, "bob").unwrap();

        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .header(header::COOKIE, format!("session={}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("invalid_token"));
    }

    #[tokio::test]
    async fn test_expired_token_is_distinguishable() {
        let auth = auth_state();
        let issued = TokenIssuer::new(SECRET)
            .issue_at(1, "alice", Utc::now() - Duration::hours(25))
            .unwrap();

        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("token_expired"));
    }

    #[tokio::test]
    async fn test_no_credentials_is_unauthorized() {
        let response = app(auth_state())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("missing_credentials"));
    }

    #[tokio::test]
    async fn test_extractor_without_gate_is_server_error() {
        let unguarded = Router::new().route("/whoami", get(whoami));

        let response = unguarded
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
