//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Authentication errors.
///
/// `Display` carries operator detail for logs. Clients only ever see
/// [`AuthError::public_message`] and [`AuthError::error_code`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither an Authorization header nor a session cookie was sent.
    #[error("no credentials presented")]
    MissingCredentials,

    /// Authorization header present but not of the form `Bearer <token>`.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Signature, algorithm or encoding check failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signature is valid but a required claim is missing or mistyped.
    #[error("malformed token claims: {0}")]
    MalformedClaims(String),

    /// Token expired.
    #[error("token expired")]
    TokenExpired,

    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A handler expected a principal but the gate never ran.
    #[error("no authenticated principal bound to request")]
    PrincipalMissing,

    /// Internal error (missing signing secret, hashing failure).
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PrincipalMissing | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable code. Invalid and malformed tokens share a code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken(_) | AuthError::MalformedClaims(_) => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::PrincipalMissing | AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "Unauthorized: no authentication provided",
            AuthError::InvalidAuthHeader => "Unauthorized: invalid token format",
            AuthError::InvalidToken(_) | AuthError::MalformedClaims(_) => {
                "Unauthorized: invalid token"
            }
            AuthError::TokenExpired => "Unauthorized: token expired",
            AuthError::InvalidCredentials => "Invalid username or password",
            AuthError::PrincipalMissing | AuthError::Internal(_) => "Internal server error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "authentication failed internally");
        }

        let body = Json(AuthErrorResponse {
            error: self.public_message().to_string(),
            error_code: self.error_code().to_string(),
        });

        (self.status_code(), body).into_response()
    }
}
