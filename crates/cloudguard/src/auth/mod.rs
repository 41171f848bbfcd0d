//! Authentication module.
//!
//! Stateless session authentication:
//! - bcrypt password hashing
//! - HMAC-signed session tokens with a fixed 24 hour lifetime
//! - a request gate reading the Authorization header, then the session cookie

mod claims;
mod config;
mod error;
mod middleware;
mod password;
mod token;
mod transport;

pub use claims::{Claims, Principal};
pub use config::{AuthConfig, ConfigValidationError};
pub use error::{AuthError, AuthErrorResponse};
pub use middleware::{AuthState, CurrentUser, auth_middleware};
pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};
pub use token::{IssuedToken, TOKEN_TTL_SECS, TokenIssuer, TokenVerifier};
pub use transport::{
    SESSION_COOKIE, TOKEN_SOURCES, TokenSource, clear_session_cookie, connection_is_encrypted,
    extract_token, session_cookie,
};
