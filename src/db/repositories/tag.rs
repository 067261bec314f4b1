//! Tag repository
//!
//! Database operations for tags and the `post_tags` link table.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Get tag by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Rename a tag
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag
    async fn delete(&self, id: i64) -> Result<()>;

    /// Replace the tags attached to a post
    async fn set_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<()>;

    /// Get tags for a post
    async fn get_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_tag_sqlite(sqlite(&self.pool)?, tag).await,
            DatabaseDriver::Mysql => create_tag_mysql(mysql(&self.pool)?, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let sql = "SELECT id, slug, name, created_at FROM tags WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get tag by ID")?;
                row.as_ref().map(row_to_tag_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get tag by ID")?;
                row.as_ref().map(row_to_tag_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_text_sqlite(sqlite(&self.pool)?, "slug", slug).await,
            DatabaseDriver::Mysql => get_tag_by_text_mysql(mysql(&self.pool)?, "slug", slug).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_text_sqlite(sqlite(&self.pool)?, "name", name).await,
            DatabaseDriver::Mysql => get_tag_by_text_mysql(mysql(&self.pool)?, "name", name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let sql = "SELECT id, slug, name, created_at FROM tags ORDER BY name";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_mysql).collect()
            }
        }
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        let sql = "UPDATE tags SET slug = ?, name = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&tag.slug)
                    .bind(&tag.name)
                    .bind(tag.id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to update tag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&tag.slug)
                    .bind(&tag.name)
                    .bind(tag.id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to update tag")?;
            }
        }

        self.get_by_id(tag.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Tag not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // post_tags rows go with it through ON DELETE CASCADE
        let sql = "DELETE FROM tags WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to delete tag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to delete tag")?;
            }
        }
        Ok(())
    }

    async fn set_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_post_tags_sqlite(sqlite(&self.pool)?, post_id, tag_ids).await,
            DatabaseDriver::Mysql => set_post_tags_mysql(mysql(&self.pool)?, post_id, tag_ids).await,
        }
    }

    async fn get_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>> {
        let sql = r#"
            SELECT t.id, t.slug, t.name, t.created_at
            FROM tags t
            INNER JOIN post_tags pt ON t.id = pt.tag_id
            WHERE pt.post_id = ?
            ORDER BY t.name
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .bind(post_id)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get tags for post")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .bind(post_id)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to get tags for post")?;
                rows.iter().map(row_to_tag_mysql).collect()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO tags (slug, name, created_at) VALUES (?, ?, ?)")
        .bind(&tag.slug)
        .bind(&tag.name)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        slug: tag.slug.clone(),
        name: tag.name.clone(),
        created_at: now,
    })
}

async fn get_tag_by_text_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<Tag>> {
    let sql = format!("SELECT id, slug, name, created_at FROM tags WHERE {} = ?", column);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get tag by {}", column))?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn set_post_tags_sqlite(pool: &SqlitePool, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to post")?;
    }

    tx.commit().await.context("Failed to commit post tags")?;
    Ok(())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO tags (slug, name, created_at) VALUES (?, ?, ?)")
        .bind(&tag.slug)
        .bind(&tag.name)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        slug: tag.slug.clone(),
        name: tag.name.clone(),
        created_at: now,
    })
}

async fn get_tag_by_text_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<Tag>> {
    let sql = format!("SELECT id, slug, name, created_at FROM tags WHERE {} = ?", column);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get tag by {}", column))?;

    row.as_ref().map(row_to_tag_mysql).transpose()
}

async fn set_post_tags_mysql(pool: &MySqlPool, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to post")?;
    }

    tx.commit().await.context("Failed to commit post tags")?;
    Ok(())
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        BlogRepository, PostRepository, SqlxBlogRepository, SqlxPostRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Blog, Post, User};

    async fn setup() -> (SqlxTagRepository, DynDatabasePool) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (SqlxTagRepository::new(pool.clone()), pool)
    }

    async fn create_post(pool: &DynDatabasePool) -> Post {
        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("writer".to_string(), String::new(), "hash".to_string(), false))
            .await
            .unwrap();
        let blog = SqlxBlogRepository::new(pool.clone())
            .create(&Blog::new(user.id, "Blog".to_string(), String::new()))
            .await
            .unwrap();
        SqlxPostRepository::new(pool.clone())
            .create(&Post::new(blog.id, "Post".to_string(), String::new()), &[])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup_tag() {
        let (repo, _) = setup().await;

        let created = repo
            .create(&Tag::new("rust".to_string(), "Rust".to_string()))
            .await
            .unwrap();
        assert!(created.id > 0);

        assert_eq!(repo.get_by_slug("rust").await.unwrap().unwrap().id, created.id);
        assert_eq!(repo.get_by_name("Rust").await.unwrap().unwrap().id, created.id);
        assert!(repo.get_by_slug("go").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_tag() {
        let (repo, _) = setup().await;
        let mut tag = repo
            .create(&Tag::new("rust".to_string(), "Rust".to_string()))
            .await
            .unwrap();

        tag.name = "Rust Lang".to_string();
        tag.slug = "rust-lang".to_string();
        let updated = repo.update(&tag).await.unwrap();
        assert_eq!(updated.slug, "rust-lang");

        repo.delete(tag.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_post_tags_replaces_links() {
        let (repo, pool) = setup().await;
        let post = create_post(&pool).await;
        let rust = repo.create(&Tag::new("rust".to_string(), "Rust".to_string())).await.unwrap();
        let web = repo.create(&Tag::new("web".to_string(), "Web".to_string())).await.unwrap();

        repo.set_post_tags(post.id, &[rust.id, web.id, rust.id]).await.unwrap();
        let names: Vec<String> = repo
            .get_by_post_id(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Rust", "Web"]);

        repo.set_post_tags(post.id, &[web.id]).await.unwrap();
        let tags = repo.get_by_post_id(post.id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, web.id);
    }
}
