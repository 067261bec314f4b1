//! Blog repository
//!
//! Database operations for blogs. `blogs.user_id` is unique, so
//! [`BlogRepository::get_by_user`] returns at most one row.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Blog;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const BLOG_COLUMNS: &str = "id, user_id, title, description, created_at, updated_at";

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Create a new blog
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    /// Get blog by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// Get the blog owned by a user
    async fn get_by_user(&self, user_id: i64) -> Result<Option<Blog>>;

    /// List all blogs, oldest first
    async fn list(&self) -> Result<Vec<Blog>>;

    /// Update title and description
    async fn update(&self, blog: &Blog) -> Result<Blog>;

    /// Delete a blog and, through the foreign key, its posts
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_blog_sqlite(sqlite(&self.pool)?, blog).await,
            DatabaseDriver::Mysql => create_blog_mysql(mysql(&self.pool)?, blog).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blog_by_sqlite(sqlite(&self.pool)?, "id", id).await,
            DatabaseDriver::Mysql => get_blog_by_mysql(mysql(&self.pool)?, "id", id).await,
        }
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<Blog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blog_by_sqlite(sqlite(&self.pool)?, "user_id", user_id).await,
            DatabaseDriver::Mysql => get_blog_by_mysql(mysql(&self.pool)?, "user_id", user_id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Blog>> {
        let sql = format!("SELECT {} FROM blogs ORDER BY id", BLOG_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list blogs")?;
                rows.iter().map(row_to_blog_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list blogs")?;
                rows.iter().map(row_to_blog_mysql).collect()
            }
        }
    }

    async fn update(&self, blog: &Blog) -> Result<Blog> {
        let sql = "UPDATE blogs SET title = ?, description = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&blog.title)
                    .bind(&blog.description)
                    .bind(now)
                    .bind(blog.id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to update blog")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&blog.title)
                    .bind(&blog.description)
                    .bind(now)
                    .bind(blog.id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to update blog")?;
            }
        }

        self.get_by_id(blog.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Blog not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM blogs WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to delete blog")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to delete blog")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blog_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<Blog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO blogs (user_id, title, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(blog.user_id)
    .bind(&blog.title)
    .bind(&blog.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create blog")?;

    Ok(Blog {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..blog.clone()
    })
}

async fn get_blog_by_sqlite(pool: &SqlitePool, column: &str, value: i64) -> Result<Option<Blog>> {
    let sql = format!("SELECT {} FROM blogs WHERE {} = ?", BLOG_COLUMNS, column);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get blog by {}", column))?;

    row.as_ref().map(row_to_blog_sqlite).transpose()
}

fn row_to_blog_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    Ok(Blog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blog_mysql(pool: &MySqlPool, blog: &Blog) -> Result<Blog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO blogs (user_id, title, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(blog.user_id)
    .bind(&blog.title)
    .bind(&blog.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create blog")?;

    Ok(Blog {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..blog.clone()
    })
}

async fn get_blog_by_mysql(pool: &MySqlPool, column: &str, value: i64) -> Result<Option<Blog>> {
    let sql = format!("SELECT {} FROM blogs WHERE {} = ?", BLOG_COLUMNS, column);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get blog by {}", column))?;

    row.as_ref().map(row_to_blog_mysql).transpose()
}

fn row_to_blog_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Blog> {
    Ok(Blog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxBlogRepository, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxBlogRepository::new(pool.clone()),
            SqlxUserRepository::new(pool),
        )
    }

    async fn user(users: &SqlxUserRepository, name: &str) -> User {
        users
            .create(&User::new(name.to_string(), String::new(), "hash".to_string(), false))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_blog() {
        let (blogs, users) = setup().await;
        let owner = user(&users, "alice").await;

        let created = blogs
            .create(&Blog::new(owner.id, "Alice".to_string(), "Notes".to_string()))
            .await
            .unwrap();
        assert!(created.id > 0);

        let by_id = blogs.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.title, "Alice");

        let by_user = blogs.get_by_user(owner.id).await.unwrap().unwrap();
        assert_eq!(by_user.id, created.id);
    }

    #[tokio::test]
    async fn test_user_owns_at_most_one_blog() {
        let (blogs, users) = setup().await;
        let owner = user(&users, "alice").await;

        blogs
            .create(&Blog::new(owner.id, "First".to_string(), String::new()))
            .await
            .unwrap();
        let second = blogs
            .create(&Blog::new(owner.id, "Second".to_string(), String::new()))
            .await;

        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete_blog() {
        let (blogs, users) = setup().await;
        let owner = user(&users, "bob").await;
        let mut blog = blogs
            .create(&Blog::new(owner.id, "Old".to_string(), String::new()))
            .await
            .unwrap();

        blog.title = "New".to_string();
        let updated = blogs.update(&blog).await.unwrap();
        assert_eq!(updated.title, "New");

        blogs.delete(blog.id).await.unwrap();
        assert!(blogs.get_by_id(blog.id).await.unwrap().is_none());
        assert!(blogs.list().await.unwrap().is_empty());
    }
}
