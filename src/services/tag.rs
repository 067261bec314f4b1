//! Tag service
//!
//! Tags are a flat taxonomy shared by every blog. Reads are public; any
//! authenticated user may create, rename or delete a tag.

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Name or slug already used by another tag
    #[error("Tag already exists: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service for managing tags
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// List all tags ordered by name
    pub async fn list(&self) -> Result<Vec<Tag>, TagServiceError> {
        let tags = self.repo.list().await.context("Failed to list tags")?;
        Ok(tags)
    }

    /// Get a tag, failing with `NotFound` when it does not exist
    pub async fn get(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")?
            .ok_or_else(|| TagServiceError::NotFound(id.to_string()))
    }

    /// Create a tag; the slug is derived from the name
    pub async fn create(&self, input: TagInput) -> Result<Tag, TagServiceError> {
        let (name, slug) = self.validated_name_and_slug(&input, None).await?;

        let tag = self
            .repo
            .create(&Tag::new(slug, name))
            .await
            .context("Failed to create tag")?;
        tracing::info!(tag_id = tag.id, slug = %tag.slug, "Created tag");
        Ok(tag)
    }

    /// Rename a tag, regenerating its slug
    pub async fn update(&self, id: i64, input: TagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self.get(id).await?;
        let (name, slug) = self.validated_name_and_slug(&input, Some(id)).await?;
        tag.name = name;
        tag.slug = slug;

        let updated = self.repo.update(&tag).await.context("Failed to update tag")?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete tag")?;
        Ok(())
    }

    /// Fail with `ValidationError` unless every id names an existing tag
    pub async fn ensure_exist(&self, tag_ids: &[i64]) -> Result<(), TagServiceError> {
        for &id in tag_ids {
            if self
                .repo
                .get_by_id(id)
                .await
                .context("Failed to get tag by ID")?
                .is_none()
            {
                return Err(TagServiceError::ValidationError(format!(
                    "Unknown tag id: {}",
                    id
                )));
            }
        }
        Ok(())
    }

    pub async fn get_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>, TagServiceError> {
        let tags = self
            .repo
            .get_by_post_id(post_id)
            .await
            .context("Failed to get tags for post")?;
        Ok(tags)
    }

    pub async fn set_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), TagServiceError> {
        self.repo
            .set_post_tags(post_id, tag_ids)
            .await
            .context("Failed to set post tags")?;
        Ok(())
    }

    async fn validated_name_and_slug(
        &self,
        input: &TagInput,
        current_id: Option<i64>,
    ) -> Result<(String, String), TagServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }

        let slug = generate_tag_slug(name);
        if slug.is_empty() {
            return Err(TagServiceError::ValidationError(format!(
                "Tag name '{}' has no usable characters",
                name
            )));
        }

        let taken_by_other = |tag: Option<Tag>| tag.is_some_and(|t| Some(t.id) != current_id);
        if taken_by_other(self.repo.get_by_name(name).await.context("Failed to get tag by name")?)
            || taken_by_other(self.repo.get_by_slug(&slug).await.context("Failed to get tag by slug")?)
        {
            return Err(TagServiceError::Conflict(name.to_string()));
        }

        Ok((name.to_string(), slug))
    }
}

/// Generate a URL-friendly slug from a tag name.
///
/// Lowercases, maps separators and ASCII punctuation to `-`, keeps non-ASCII
/// letters, collapses runs of hyphens and trims them from both ends.
pub fn generate_tag_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric()) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
