//! Tag model
//!
//! Tags are a free taxonomy attached to posts. They carry no ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Tag name
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag with the given parameters.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(slug: String, name: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            slug,
            name,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating or renaming a tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
}
