//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Secret shipped as the default by earlier releases. Never accepted at startup.
const LEGACY_DEFAULT_SECRET: &str = "cloudguard-secret";

/// Minimum accepted length of the signing secret.
const MIN_SECRET_LENGTH: usize = 32;

/// Work factors bcrypt accepts.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify session tokens.
    /// Supports `env:VAR_NAME` to read the value from the environment.
    pub jwt_secret: Option<String>,

    /// bcrypt work factor for stored password hashes.
    pub bcrypt_cost: u32,

    /// Allowed CORS origins. If empty, cross-origin requests are denied.
    pub allowed_origins: Vec<String>,

    /// Treat `X-Forwarded-Proto: https` as an encrypted inbound connection.
    /// Only enable behind a reverse proxy that sets this header itself.
    pub trust_forwarded_proto: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            bcrypt_cost: 10,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            trust_forwarded_proto: false,
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else if value.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration before the server starts accepting requests.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if secret == LEGACY_DEFAULT_SECRET {
            return Err(ConfigValidationError::InsecureJwtSecret);
        }
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(ConfigValidationError::InvalidBcryptCost(self.bcrypt_cost));
        }

        Ok(())
    }

    /// Generate a secure random JWT secret using the OS-backed thread RNG.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// No signing secret configured.
    MissingJwtSecret,
    /// Signing secret is the legacy default value.
    InsecureJwtSecret,
    /// Signing secret is shorter than 32 characters.
    JwtSecretTooShort,
    /// bcrypt cost outside the range the algorithm accepts.
    InvalidBcryptCost(u32),
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => write!(
                f,
                "JWT secret is required. Set CLOUDGUARD_AUTH__JWT_SECRET or auth.jwt_secret in config."
            ),
            Self::InsecureJwtSecret => write!(
                f,
                "JWT secret cannot be the legacy default value. Please configure a secure secret."
            ),
            Self::JwtSecretTooShort => write!(
                f,
                "JWT secret must be at least {MIN_SECRET_LENGTH} characters long."
            ),
            Self::InvalidBcryptCost(cost) => write!(
                f,
                "bcrypt cost {cost} is out of range ({}..={}).",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            ),
            Self::EnvVarNotFound(var) => {
                write!(f, "Environment variable '{var}' referenced by jwt_secret is not set.")
            }
            Self::EnvVarEmpty(var) => {
                write!(f, "Environment variable '{var}' referenced by jwt_secret is empty.")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}
