//! Post repository
//!
//! Database operations for posts. Listings take a [`PostFilter`] and join
//! `blogs` so ownership scoping happens in SQL.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Post;
use crate::policy::{PostFilter, PostScope};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post linked to `tag_ids`; the post and its links are
    /// written in one transaction
    async fn create(&self, post: &Post, tag_ids: &[i64]) -> Result<Post>;

    /// Get post by ID, ignoring any scope
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// List posts passing `filter`, newest first
    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>>;

    /// Update blog, title and content
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Build the listing query for a filter.
///
/// Returns `None` when the filter can match nothing, so callers skip the
/// round trip. Bind values are returned in placeholder order.
fn list_query(filter: &PostFilter) -> Option<(String, Vec<i64>)> {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    match filter.scope {
        PostScope::Nothing => return None,
        PostScope::All => {}
        PostScope::OwnedBy(user_id) => {
            conditions.push("b.user_id = ?");
            binds.push(user_id);
        }
    }
    if let Some(blog_id) = filter.blog_id {
        conditions.push("p.blog_id = ?");
        binds.push(blog_id);
    }

    let mut sql = String::from(
        "SELECT p.id, p.blog_id, p.title, p.content, p.created_at, p.updated_at \
         FROM posts p JOIN blogs b ON b.id = p.blog_id",
    );
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY p.created_at DESC, p.id DESC");

    Some((sql, binds))
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post, tag_ids: &[i64]) -> Result<Post> {
        let tag_ids = unique_tag_ids(tag_ids);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(sqlite(&self.pool)?, post, &tag_ids).await,
            DatabaseDriver::Mysql => create_post_mysql(mysql(&self.pool)?, post, &tag_ids).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = "SELECT id, blog_id, title, content, created_at, updated_at FROM posts WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get post by ID")?;
                row.as_ref().map(row_to_post_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get post by ID")?;
                row.as_ref().map(row_to_post_mysql).transpose()
            }
        }
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let Some((sql, binds)) = list_query(filter) else {
            return Ok(Vec::new());
        };

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut query = sqlx::query(&sql);
                for value in &binds {
                    query = query.bind(*value);
                }
                let rows = query
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list posts")?;
                rows.iter().map(row_to_post_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let mut query = sqlx::query(&sql);
                for value in &binds {
                    query = query.bind(*value);
                }
                let rows = query
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list posts")?;
                rows.iter().map(row_to_post_mysql).collect()
            }
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let sql = "UPDATE posts SET blog_id = ?, title = ?, content = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(post.blog_id)
                    .bind(&post.title)
                    .bind(&post.content)
                    .bind(now)
                    .bind(post.id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to update post")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(post.blog_id)
                    .bind(&post.title)
                    .bind(&post.content)
                    .bind(now)
                    .bind(post.id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to update post")?;
            }
        }

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM posts WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to delete post")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to delete post")?;
            }
        }
        Ok(())
    }
}

/// Tag ids in first-seen order without repeats
fn unique_tag_ids(tag_ids: &[i64]) -> Vec<i64> {
    let mut unique = Vec::with_capacity(tag_ids.len());
    for id in tag_ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &Post, tag_ids: &[i64]) -> Result<Post> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO posts (blog_id, title, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.blog_id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create post")?;
    let id = result.last_insert_rowid();

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to post")?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(Post {
        id,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        blog_id: row.try_get("blog_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &Post, tag_ids: &[i64]) -> Result<Post> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO posts (blog_id, title, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.blog_id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create post")?;
    let id = result.last_insert_id() as i64;

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to post")?;
    }

    tx.commit().await.context("Failed to commit post")?;
    Ok(Post {
        id,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        blog_id: row.try_get("blog_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        BlogRepository, SqlxBlogRepository, SqlxTagRepository, SqlxUserRepository, TagRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Blog, Tag, User};

    struct Fixture {
        posts: SqlxPostRepository,
        tags: SqlxTagRepository,
        alice: i64,
        carol: i64,
        alice_blog: i64,
        carol_blog: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let users = SqlxUserRepository::new(pool.clone());
        let blogs = SqlxBlogRepository::new(pool.clone());

        let mut ids = Vec::new();
        for name in ["alice", "carol"] {
            let user = users
                .create(&User::new(name.to_string(), String::new(), "hash".to_string(), false))
                .await
                .unwrap();
            let blog = blogs
                .create(&Blog::new(user.id, name.to_string(), String::new()))
                .await
                .unwrap();
            ids.push((user.id, blog.id));
        }

        Fixture {
            posts: SqlxPostRepository::new(pool.clone()),
            tags: SqlxTagRepository::new(pool),
            alice: ids[0].0,
            alice_blog: ids[0].1,
            carol: ids[1].0,
            carol_blog: ids[1].1,
        }
    }

    #[test]
    fn test_list_query_nothing_skips_database() {
        assert!(list_query(&PostFilter::new(PostScope::Nothing)).is_none());
        assert!(list_query(&PostFilter::new(PostScope::Nothing).with_blog(3)).is_none());
    }

    #[test]
    fn test_list_query_binds_in_placeholder_order() {
        let (sql, binds) = list_query(&PostFilter::new(PostScope::OwnedBy(7)).with_blog(3)).unwrap();
        assert!(sql.contains("WHERE b.user_id = ? AND p.blog_id = ?"));
        assert_eq!(binds, vec![7, 3]);

        let (sql, binds) = list_query(&PostFilter::new(PostScope::All)).unwrap();
        assert!(!sql.contains("WHERE"));
        assert!(binds.is_empty());
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner() {
        let fx = setup().await;
        let p1 = fx
            .posts
            .create(&Post::new(fx.alice_blog, "P1".to_string(), String::new()), &[])
            .await
            .unwrap();
        let p2 = fx
            .posts
            .create(&Post::new(fx.carol_blog, "P2".to_string(), String::new()), &[])
            .await
            .unwrap();

        let mine = fx.posts.list(&PostFilter::new(PostScope::OwnedBy(fx.alice))).await.unwrap();
        assert_eq!(mine.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p1.id]);

        let theirs = fx.posts.list(&PostFilter::new(PostScope::OwnedBy(fx.carol))).await.unwrap();
        assert_eq!(theirs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p2.id]);

        let mut all: Vec<i64> = fx
            .posts
            .list(&PostFilter::new(PostScope::All))
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        all.sort();
        assert_eq!(all, vec![p1.id, p2.id]);

        assert!(fx.posts.list(&PostFilter::new(PostScope::Nothing)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_links_tags() {
        let fx = setup().await;
        let rust = fx.tags.create(&Tag::new("rust".to_string(), "Rust".to_string())).await.unwrap();

        let post = fx
            .posts
            .create(&Post::new(fx.alice_blog, "Tagged".to_string(), String::new()), &[rust.id, rust.id])
            .await
            .unwrap();

        let tags = fx.tags.get_by_post_id(post.id).await.unwrap();
        assert_eq!(tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![rust.id]);
    }

    #[tokio::test]
    async fn test_create_with_unknown_tag_writes_nothing() {
        let fx = setup().await;

        let result = fx
            .posts
            .create(&Post::new(fx.alice_blog, "Orphan".to_string(), String::new()), &[999])
            .await;
        assert!(result.is_err());
        assert!(fx.posts.list(&PostFilter::new(PostScope::All)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_blog_intersects_scope() {
        let fx = setup().await;
        fx.posts
            .create(&Post::new(fx.carol_blog, "P2".to_string(), String::new()), &[])
            .await
            .unwrap();

        let all_on_carol = PostFilter::new(PostScope::All).with_blog(fx.carol_blog);
        assert_eq!(fx.posts.list(&all_on_carol).await.unwrap().len(), 1);

        let alice_on_carol = PostFilter::new(PostScope::OwnedBy(fx.alice)).with_blog(fx.carol_blog);
        assert!(fx.posts.list(&alice_on_carol).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_moves_post_and_delete() {
        let fx = setup().await;
        let mut post = fx
            .posts
            .create(&Post::new(fx.alice_blog, "Draft".to_string(), "body".to_string()), &[])
            .await
            .unwrap();

        post.blog_id = fx.carol_blog;
        post.title = "Moved".to_string();
        let updated = fx.posts.update(&post).await.unwrap();
        assert_eq!(updated.blog_id, fx.carol_blog);
        assert_eq!(updated.title, "Moved");

        fx.posts.delete(post.id).await.unwrap();
        assert!(fx.posts.get_by_id(post.id).await.unwrap().is_none());
    }
}
