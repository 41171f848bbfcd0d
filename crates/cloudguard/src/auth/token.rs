//! Session token issuing and verification (HMAC-signed JWT).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::{AuthError, Claims, Principal};

/// Lifetime of every issued token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Algorithm used when signing. Never caller-selected.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted when verifying: the HMAC family only.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs session tokens with the server secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for an account, valid for 24 hours from now.
    pub fn issue(&self, id: i64, username: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(id, username, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let exp = now.timestamp() + TOKEN_TTL_SECS;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".to_string()))?;

        let claims = Claims {
            id,
            username: username.to_string(),
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }
}

/// Verifies session tokens against the server secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Claim shape and expiry are checked explicitly after the signature.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// signature and algorithm, claim shape, then expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let raw = decode::<serde_json::Value>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(format!("{:?}", e.kind())))?
            .claims;

        let claims: Claims =
            serde_json::from_value(raw).map_err(|e| AuthError::MalformedClaims(e.to_string()))?;

        if !claims.is_live_at(now.timestamp()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims.into())
    }
}
