//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::user::UserService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account registration, login and lookup.
    pub users: Arc<UserService>,
    /// Token issuing and verification.
    pub auth: AuthState,
}

impl AppState {
    pub fn new(users: UserService, auth: AuthState) -> Self {
        Self {
            users: Arc::new(users),
            auth,
        }
    }
}
