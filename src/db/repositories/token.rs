//! Token repository
//!
//! Storage for API tokens. The `tokens.user_id` column is unique, so a user
//! has at most one token at a time.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Token;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a new token
    async fn create(&self, token: &Token) -> Result<Token>;

    /// Look up a token by its key
    async fn get_by_key(&self, key: &str) -> Result<Option<Token>>;

    /// Look up the token held by a user
    async fn get_by_user(&self, user_id: i64) -> Result<Option<Token>>;

    /// Delete the user's token, returning whether one existed
    async fn delete_by_user(&self, user_id: i64) -> Result<bool>;
}

/// SQLx-based token repository implementation
pub struct SqlxTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_one_by(&self, column: &str, value: TokenLookup<'_>) -> Result<Option<Token>> {
        let sql = format!(
            "SELECT token_key, user_id, created_at FROM tokens WHERE {} = ?",
            column
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let query = sqlx::query(&sql);
                let query = match value {
                    TokenLookup::Key(key) => query.bind(key),
                    TokenLookup::User(user_id) => query.bind(user_id),
                };
                let row = query
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get token")?;
                row.map(|row| {
                    Ok(Token {
                        key: row.try_get("token_key")?,
                        user_id: row.try_get("user_id")?,
                        created_at: row.try_get("created_at")?,
                    })
                })
                .transpose()
            }
            DatabaseDriver::Mysql => {
                let query = sqlx::query(&sql);
                let query = match value {
                    TokenLookup::Key(key) => query.bind(key),
                    TokenLookup::User(user_id) => query.bind(user_id),
                };
                let row = query
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get token")?;
                row.map(|row| {
                    Ok(Token {
                        key: row.try_get("token_key")?,
                        user_id: row.try_get("user_id")?,
                        created_at: row.try_get("created_at")?,
                    })
                })
                .transpose()
            }
        }
    }
}

enum TokenLookup<'a> {
    Key(&'a str),
    User(i64),
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn create(&self, token: &Token) -> Result<Token> {
        let sql = "INSERT INTO tokens (token_key, user_id, created_at) VALUES (?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&token.key)
                    .bind(token.user_id)
                    .bind(token.created_at)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to create token")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&token.key)
                    .bind(token.user_id)
                    .bind(token.created_at)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to create token")?;
            }
        }
        Ok(token.clone())
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Token>> {
        self.fetch_one_by("token_key", TokenLookup::Key(key)).await
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<Token>> {
        self.fetch_one_by("user_id", TokenLookup::User(user_id)).await
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<bool> {
        let sql = "DELETE FROM tokens WHERE user_id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete token")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete token")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxTokenRepository, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("tok".to_string(), String::new(), "hash".to_string(), false))
            .await
            .unwrap();
        (SqlxTokenRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_create_and_lookup_token() {
        let (repo, user_id) = setup().await;
        let token = Token::generate(user_id);
        repo.create(&token).await.unwrap();

        let by_key = repo.get_by_key(&token.key).await.unwrap().unwrap();
        assert_eq!(by_key.user_id, user_id);

        let by_user = repo.get_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(by_user.key, token.key);
    }

    #[tokio::test]
    async fn test_one_token_per_user() {
        let (repo, user_id) = setup().await;
        repo.create(&Token::generate(user_id)).await.unwrap();

        assert!(repo.create(&Token::generate(user_id)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let (repo, user_id) = setup().await;
        let token = Token::generate(user_id);
        repo.create(&token).await.unwrap();

        assert!(repo.delete_by_user(user_id).await.unwrap());
        assert!(repo.get_by_key(&token.key).await.unwrap().is_none());
        assert!(!repo.delete_by_user(user_id).await.unwrap());
    }
}
