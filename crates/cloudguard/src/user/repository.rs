//! Account repository for database operations.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{NewAccount, User};
use super::store::AccountStore;

/// SQLite-backed account store.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an account by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        Ok(user)
    }

    /// Get an account by username.
    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;

        Ok(user)
    }

    /// Create a new account.
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub async fn create(&self, account: NewAccount) -> Result<User> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        debug!("Creating user: {}", account.username);

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, full_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(&created_at)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                bail!("Username '{}' already exists.", account.username)
            }
            Err(e) => return Err(e).context("Failed to insert user"),
        };

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after creation"))
    }
}

#[async_trait]
impl AccountStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_by_username(username).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get(id).await
    }

    async fn insert(&self, account: NewAccount) -> Result<User> {
        self.create(account).await
    }
}
