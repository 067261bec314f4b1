//! Blog model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description given to blogs provisioned on a user's first post
pub const DEFAULT_BLOG_DESCRIPTION: &str = "Blog personal";

/// A blog, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Blog title
    pub title: String,
    /// Blog description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn new(user_id: i64, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            title,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a blog
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Input for updating a blog; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBlogInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateBlogInput {
    /// Apply the provided fields onto an existing blog
    pub fn apply_to(self, blog: &mut Blog) {
        if let Some(title) = self.title {
            blog.title = title;
        }
        if let Some(description) = self.description {
            blog.description = description;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_input_applies_only_given_fields() {
        let mut blog = Blog::new(1, "Old".to_string(), "Keep me".to_string());
        UpdateBlogInput {
            title: Some("New".to_string()),
            description: None,
        }
        .apply_to(&mut blog);

        assert_eq!(blog.title, "New");
        assert_eq!(blog.description, "Keep me");
    }
}
