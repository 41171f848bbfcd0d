//! Account service: registration and credential checks.

use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use super::models::{NewAccount, RegisterRequest, User};
use super::store::AccountStore;
use crate::auth::{hash_password_blocking, verify_password_blocking};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Hashed once per service and checked against for unknown usernames.
const DUMMY_PASSWORD: &str = "cloudguard-dummy-password";

/// Service for account operations.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn AccountStore>,
    bcrypt_cost: u32,
    dummy_hash: Arc<OnceCell<String>>,
}

impl UserService {
    pub fn new(store: Arc<dyn AccountStore>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Register a new account with validation.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        if !is_valid_username(&request.username) {
            bail!(
                "Invalid username format. Must be 3-50 alphanumeric characters, underscores, or hyphens."
            );
        }

        if request.password.len() < MIN_PASSWORD_LENGTH {
            bail!("Password must be at least {MIN_PASSWORD_LENGTH} characters.");
        }

        if self
            .store
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            bail!("Username '{}' already exists.", request.username);
        }

        let password_hash = hash_password_blocking(request.password, self.bcrypt_cost).await?;

        let user = self
            .store
            .insert(NewAccount {
                username: request.username,
                password_hash,
                full_name: request.full_name.unwrap_or_default(),
            })
            .await?;
        info!(user_id = user.id, username = %user.username, "Registered new user");

        Ok(user)
    }

    /// Verify a username/password pair.
    ///
    /// Returns `None` for an unknown username and for a wrong password alike.
    /// Only the logs tell them apart. An unknown username still pays for one
    /// bcrypt verification so both failures take the same time.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.store.find_by_username(username).await? else {
            let dummy_hash = self.dummy_hash().await?;
            verify_password_blocking(password.to_string(), dummy_hash.to_string()).await?;
            warn!("Login failed: unknown username");
            return Ok(None);
        };

        if verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            Ok(Some(user))
        } else {
            warn!(user_id = user.id, "Login failed: password mismatch");
            Ok(None)
        }
    }

    /// Get an account by ID.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.store.find_by_id(id).await
    }

    async fn dummy_hash(&self) -> Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password_blocking(DUMMY_PASSWORD.to_string(), self.bcrypt_cost))
            .await?;
        Ok(hash.as_str())
    }
}

/// Validate username format.
fn is_valid_username(username: &str) -> bool {
    let len = username.len();
    if !(3..=50).contains(&len) {
        return false;
    }

    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::user::UserRepository;

    const TEST_COST: u32 = 4;

    async fn service() -> UserService {
        let db = Database::in_memory().await.unwrap();
        UserService::new(Arc::new(UserRepository::new(db.pool().clone())), TEST_COST)
    }

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            full_name: None,
        }
    }

    #[test]
    fn test_is_valid_username() {
        assert!(is_valid_username("user"));
        assert!(is_valid_username("user_name"));
        assert!(is_valid_username("user-name"));
        assert!(is_valid_username("user123"));
        assert!(!is_valid_username("ab")); // too short
        assert!(!is_valid_username(&"a".repeat(51)));
        assert!(!is_valid_username("user@name")); // invalid char
        assert!(!is_valid_username("user name")); // space
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let service = service().await;
        let user = service
            .register(RegisterRequest {
                full_name: Some("Alice Example".to_string()),
                ..request("alice", "password123")
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.full_name, "Alice Example");
        assert_ne!(user.password_hash, "password123");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let service = service().await;

        let err = service.register(request("a", "password123")).await.unwrap_err();
        assert!(err.to_string().contains("Invalid username"));

        let err = service.register(request("alice", "short")).await.unwrap_err();
        assert!(err.to_string().contains("must be at least"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate() {
        let service = service().await;
        service.register(request("alice", "password123")).await.unwrap();

        let err = service
            .register(request("alice", "different1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let service = service().await;
        let registered = service.register(request("bob", "hunter22")).await.unwrap();

        let user = service
            .verify_credentials("bob", "hunter22")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, registered.id);

        assert!(
            service
                .verify_credentials("bob", "wrong-password")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            service
                .verify_credentials("nobody", "hunter22")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_username_still_runs_bcrypt() {
        let service = service().await;
        assert!(service.dummy_hash.get().is_none());

        assert!(
            service
                .verify_credentials("nobody", "hunter22")
                .await
                .unwrap()
                .is_none()
        );

        let dummy = service.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$2b$04$"));
        assert!(bcrypt::verify(DUMMY_PASSWORD, dummy).unwrap());
    }

    #[tokio::test]
    async fn test_get_user() {
        let service = service().await;
        let registered = service.register(request("carol", "password123")).await.unwrap();

        let fetched = service.get_user(registered.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "carol");
        assert!(service.get_user(registered.id + 100).await.unwrap().is_none());
    }
}
