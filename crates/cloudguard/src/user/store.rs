//! The account store seam.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewAccount, User};

/// Persistence for accounts.
///
/// Read by login and `GET /api/user`, written by registration. The auth core
/// never touches it directly.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Insert an account. A taken username fails with an "already exists" error.
    async fn insert(&self, account: NewAccount) -> Result<User>;
}
