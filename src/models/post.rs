//! Post model
//!
//! A post belongs to exactly one blog. Its owner is the blog's owner; the
//! post itself carries no user reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tag;

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Blog this post is published on
    pub blog_id: i64,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(blog_id: i64, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            blog_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post together with its tags
#[derive(Debug, Clone, Serialize)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
}

/// Input for creating a post.
///
/// The target blog is never taken from the client on the public API: it is
/// always the author's own blog.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Input for updating a post; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
}
