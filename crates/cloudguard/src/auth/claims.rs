//! Session token claims and the authenticated principal.

use serde::{Deserialize, Serialize};

/// Claims carried inside every session token.
///
/// Field names are part of the wire format shared with existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID.
    pub id: i64,

    /// Account username at issuance time.
    pub username: String,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Unique token ID.
    pub jti: String,
}

impl Claims {
    /// Whether the token is still valid at `now` (Unix seconds).
    /// A token is expired from the instant `now` reaches `exp`.
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

/// The authenticated caller of a single request.
///
/// Built from verified claims; never re-read from the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
        }
    }
}
