//! User service
//!
//! Registration, credential checks and the token lifecycle:
//! - [`UserService::authenticate`] verifies a username/password pair
//! - [`UserService::create_token`] returns the user's API token, creating it on first use
//! - [`UserService::delete_token`] revokes it
//! - [`UserService::validate_token`] resolves a presented key back to its user

use crate::db::repositories::{TokenRepository, UserRepository};
use crate::models::{Token, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Message returned for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown user, wrong password or inactive account
    #[error("{0}")]
    InvalidCredentials(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterInput {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    token_repo: Arc<dyn TokenRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, token_repo: Arc<dyn TokenRepository>) -> Self {
        Self {
            user_repo,
            token_repo,
        }
    }

    /// Register a regular (non-superuser) account
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.create_user(input, false).await
    }

    /// Create a superuser account, used to bootstrap a fresh install
    pub async fn create_superuser(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.create_user(input, true).await
    }

    /// Verify credentials.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with
    /// the same [`INVALID_CREDENTIALS`] message.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, UserServiceError> {
        let invalid = || UserServiceError::InvalidCredentials(INVALID_CREDENTIALS.to_string());

        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid || !user.is_active {
            tracing::debug!(user_id = user.id, "Rejected login attempt");
            return Err(invalid());
        }

        Ok(user)
    }

    /// Return the user's token, creating one if they have none
    pub async fn create_token(&self, user: &User) -> Result<Token, UserServiceError> {
        if let Some(token) = self
            .token_repo
            .get_by_user(user.id)
            .await
            .context("Failed to get token")?
        {
            return Ok(token);
        }

        match self.token_repo.create(&Token::generate(user.id)).await {
            Ok(token) => {
                tracing::info!(user_id = user.id, "Issued API token");
                Ok(token)
            }
            // Another login for the same user inserted first
            Err(err) => self
                .token_repo
                .get_by_user(user.id)
                .await
                .context("Failed to get token")?
                .ok_or_else(|| UserServiceError::InternalError(err.context("Failed to create token"))),
        }
    }

    /// Revoke the user's token. Returns whether there was one.
    pub async fn delete_token(&self, user: &User) -> Result<bool, UserServiceError> {
        let deleted = self
            .token_repo
            .delete_by_user(user.id)
            .await
            .context("Failed to delete token")?;
        Ok(deleted)
    }

    /// Resolve a presented token key to an active user
    pub async fn validate_token(&self, key: &str) -> Result<Option<User>, UserServiceError> {
        let Some(token) = self
            .token_repo
            .get_by_key(key)
            .await
            .context("Failed to get token")?
        else {
            return Ok(None);
        };

        let user = self
            .user_repo
            .get_by_id(token.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(|u| u.is_active))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;
        Ok(user)
    }

    async fn create_user(&self, input: RegisterInput, is_superuser: bool) -> Result<User, UserServiceError> {
        validate_register_input(&input)?;

        if self.get_by_username(&input.username).await?.is_some() {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, is_superuser);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        tracing::info!(user_id = created.id, is_superuser, "Created user");
        Ok(created)
    }
}

fn validate_register_input(input: &RegisterInput) -> Result<(), UserServiceError> {
    if input.username.trim().is_empty() {
        return Err(UserServiceError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    if input.password.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Password cannot be empty".to_string(),
        ));
    }
    if !input.email.is_empty() && !input.email.contains('@') {
        return Err(UserServiceError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTokenRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool),
        )
    }

    #[tokio::test]
    async fn test_register_creates_regular_user() {
        let service = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("alice", "alice@example.com", "secret"))
            .await
            .unwrap();

        assert!(!user.is_superuser);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "secret");
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let service = setup_test_service().await;
        service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();

        let result = service.register(RegisterInput::new("alice", "", "other")).await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = setup_test_service().await;

        for input in [
            RegisterInput::new(" ", "", "secret"),
            RegisterInput::new("bob", "", ""),
            RegisterInput::new("bob", "not-an-email", "secret"),
        ] {
            let result = service.register(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_create_superuser() {
        let service = setup_test_service().await;

        let admin = service
            .create_superuser(RegisterInput::new("root", "", "secret"))
            .await
            .unwrap();
        assert!(admin.is_superuser);
    }

    #[tokio::test]
    async fn test_authenticate_failures_share_one_message() {
        let service = setup_test_service().await;
        service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();

        for (username, password) in [("alice", "wrong"), ("nobody", "secret")] {
            match service.authenticate(username, password).await {
                Err(UserServiceError::InvalidCredentials(message)) => {
                    assert_eq!(message, "Invalid credentials")
                }
                other => panic!("expected InvalidCredentials, got {:?}", other.map(|u| u.id)),
            }
        }

        let user = service.authenticate("alice", "secret").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_user() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let users = SqlxUserRepository::boxed(pool.clone());
        let service = UserService::new(users.clone(), SqlxTokenRepository::boxed(pool));

        let mut user = service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();
        user.is_active = false;
        users.update(&user).await.unwrap();

        assert!(matches!(
            service.authenticate("alice", "secret").await,
            Err(UserServiceError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_create_token_is_get_or_create() {
        let service = setup_test_service().await;
        let user = service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();

        let first = service.create_token(&user).await.unwrap();
        let second = service.create_token(&user).await.unwrap();
        assert_eq!(first.key, second.key);

        let resolved = service.validate_token(&first.key).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_concurrent_logins_share_one_token() {
        let service = setup_test_service().await;
        let user = service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();

        let (a, b) = tokio::join!(service.create_token(&user), service.create_token(&user));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.key, b.key);
        assert_eq!(a.user_id, user.id);
    }

    #[tokio::test]
    async fn test_delete_token_revokes() {
        let service = setup_test_service().await;
        let user = service.register(RegisterInput::new("alice", "", "secret")).await.unwrap();
        let token = service.create_token(&user).await.unwrap();

        assert!(service.delete_token(&user).await.unwrap());
        assert!(service.validate_token(&token.key).await.unwrap().is_none());
        assert!(!service.delete_token(&user).await.unwrap());

        let fresh = service.create_token(&user).await.unwrap();
        assert_ne!(fresh.key, token.key);
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let service = setup_test_service().await;
        assert!(service.validate_token("deadbeef").await.unwrap().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        /// Login followed by token validation yields the registered user
        #[test]
        fn prop_login_token_roundtrip(
            username in "[a-z]{3,12}",
            password in "[a-zA-Z0-9!@#$%^&*]{8,20}"
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_test_service().await;
                let registered = service
                    .register(RegisterInput::new(username.clone(), "", password.clone()))
                    .await
                    .expect("Registration should succeed");

                let user = service.authenticate(&username, &password).await
                    .expect("Login should succeed with valid credentials");
                let token = service.create_token(&user).await.unwrap();
                let resolved = service.validate_token(&token.key).await.unwrap()
                    .expect("Token should resolve");

                prop_assert_eq!(resolved.id, registered.id);
                Ok(())
            });
            result?;
        }
    }
}
