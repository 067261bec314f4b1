//! Post service
//!
//! Posts are read through one of two scopes: the public API scope
//! ([`viewset_post_scope`]) or the admin scope ([`admin_post_scope`]). A post
//! outside the caller's scope is reported as not found.
//!
//! Writes through the public API go to the author's own blog, which is
//! provisioned on the first post. Admin saves pick the blog explicitly and
//! are checked by [`authorize_admin_post_save`].

use crate::db::repositories::PostRepository;
use crate::models::{Blog, CreatePostInput, Post, PostWithTags, UpdatePostInput};
use crate::policy::{
    admin_post_scope, authorize_admin_post_save, authorize_post_create, authorize_post_destroy,
    authorize_post_update, limit_blog_choices, readonly_fields, viewset_post_scope, Actor,
    PolicyError, PostFilter, PostScope, BLOG_FIELD,
};
use crate::services::blog::{BlogService, BlogServiceError};
use crate::services::tag::{TagService, TagServiceError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fields of the admin post form that are never editable
pub const ADMIN_POST_READONLY_FIELDS: &[&str] = &["created_at", "updated_at"];

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found, or outside the caller's scope
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Rejected by the ownership rules
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for PostServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg)
            | TagServiceError::ValidationError(msg)
            | TagServiceError::Conflict(msg) => Self::ValidationError(msg),
            TagServiceError::InternalError(e) => Self::InternalError(e),
        }
    }
}

impl From<BlogServiceError> for PostServiceError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound(msg) => Self::ValidationError(format!("Unknown blog: {}", msg)),
            BlogServiceError::ValidationError(msg) | BlogServiceError::Conflict(msg) => {
                Self::ValidationError(msg)
            }
            BlogServiceError::Policy(e) => Self::Policy(e),
            BlogServiceError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// Body of an admin add/change submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPostInput {
    pub blog_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
}

/// What the admin post form offers the current user
#[derive(Debug, Clone, Serialize)]
pub struct AdminPostForm {
    pub readonly_fields: Vec<String>,
    pub blog_choices: Vec<Blog>,
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    blogs: Arc<BlogService>,
    tags: Arc<TagService>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, blogs: Arc<BlogService>, tags: Arc<TagService>) -> Self {
        Self { repo, blogs, tags }
    }

    /// List posts passing `filter`, with their tags
    pub async fn list(&self, filter: &PostFilter) -> Result<Vec<PostWithTags>, PostServiceError> {
        let posts = self.repo.list(filter).await.context("Failed to list posts")?;

        let mut result = Vec::with_capacity(posts.len());
        for post in posts {
            result.push(self.with_tags(post).await?);
        }
        Ok(result)
    }

    /// Fetch a post if it is inside `scope`
    pub async fn get(&self, scope: PostScope, id: i64) -> Result<PostWithTags, PostServiceError> {
        let (post, _) = self.get_scoped(scope, id).await?;
        self.with_tags(post).await
    }

    /// Publish a post on the author's blog, provisioning the blog if needed
    pub async fn create(&self, actor: &Actor, input: CreatePostInput) -> Result<PostWithTags, PostServiceError> {
        let user = authorize_post_create(actor)?;
        let title = validate_title(&input.title)?;
        self.tags.ensure_exist(&input.tag_ids).await?;

        let blog = self.blogs.get_or_provision(user).await?;
        let post = self
            .repo
            .create(&Post::new(blog.id, title, input.content), &input.tag_ids)
            .await
            .context("Failed to create post")?;

        tracing::info!(post_id = post.id, blog_id = blog.id, user_id = user.id, "Created post");
        self.with_tags(post).await
    }

    /// Edit a post through the public API
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<PostWithTags, PostServiceError> {
        if !actor.is_authenticated() {
            return Err(PolicyError::not_authenticated("Authentication required to edit posts.").into());
        }
        let (mut post, blog) = self.get_scoped(viewset_post_scope(actor), id).await?;
        authorize_post_update(actor, &blog)?;

        if let Some(title) = &input.title {
            post.title = validate_title(title)?;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        self.save(post, input.tag_ids.as_deref()).await
    }

    /// Delete a post through the public API
    pub async fn destroy(&self, actor: &Actor, id: i64) -> Result<(), PostServiceError> {
        if !actor.is_authenticated() {
            return Err(PolicyError::not_authenticated("Authentication required to delete posts.").into());
        }
        let (post, blog) = self.get_scoped(viewset_post_scope(actor), id).await?;
        authorize_post_destroy(actor, &blog)?;

        self.delete(post.id).await
    }

    /// Admin changelist
    pub async fn admin_list(&self, actor: &Actor) -> Result<Vec<PostWithTags>, PostServiceError> {
        self.list(&PostFilter::new(admin_post_scope(actor))).await
    }

    /// Read-only fields and blog choices for the add form (`post_id` is
    /// `None`) or the change form of an existing post
    pub async fn admin_form(
        &self,
        actor: &Actor,
        post_id: Option<i64>,
    ) -> Result<AdminPostForm, PostServiceError> {
        if let Some(id) = post_id {
            self.get_scoped(admin_post_scope(actor), id).await?;
        }

        let blogs = self.blogs.list().await?;
        Ok(AdminPostForm {
            readonly_fields: readonly_fields(actor, ADMIN_POST_READONLY_FIELDS, post_id.is_some()),
            blog_choices: limit_blog_choices(actor, blogs),
        })
    }

    /// Save the admin post form.
    ///
    /// Read-only fields in `input` are ignored. Adding requires the actor may
    /// post on the chosen blog; changing only checks a move to another blog.
    pub async fn save_admin(
        &self,
        actor: &Actor,
        post_id: Option<i64>,
        mut input: AdminPostInput,
    ) -> Result<PostWithTags, PostServiceError> {
        let readonly = readonly_fields(actor, ADMIN_POST_READONLY_FIELDS, post_id.is_some());
        if readonly.iter().any(|f| f == BLOG_FIELD) {
            input.blog_id = None;
        }
        if let Some(tag_ids) = &input.tag_ids {
            self.tags.ensure_exist(tag_ids).await?;
        }

        match post_id {
            None => {
                let blog_id = input
                    .blog_id
                    .ok_or_else(|| PostServiceError::ValidationError("blog_id is required".to_string()))?;
                let title = validate_title(input.title.as_deref().unwrap_or_default())?;
                let blog = self.blogs.get(blog_id).await?;
                authorize_admin_post_save(actor, &blog, false, &[])?;

                let post = self
                    .repo
                    .create(
                        &Post::new(blog.id, title, input.content.unwrap_or_default()),
                        input.tag_ids.as_deref().unwrap_or_default(),
                    )
                    .await
                    .context("Failed to create post")?;
                tracing::info!(post_id = post.id, blog_id = blog.id, "Added post from admin");
                self.with_tags(post).await
            }
            Some(id) => {
                let (mut post, current_blog) = self.get_scoped(admin_post_scope(actor), id).await?;

                let mut changed_fields = Vec::new();
                let target_blog = match input.blog_id {
                    Some(blog_id) if blog_id != post.blog_id => {
                        changed_fields.push(BLOG_FIELD);
                        self.blogs.get(blog_id).await?
                    }
                    _ => current_blog,
                };
                authorize_admin_post_save(actor, &target_blog, true, &changed_fields)?;

                post.blog_id = target_blog.id;
                if let Some(title) = &input.title {
                    post.title = validate_title(title)?;
                }
                if let Some(content) = input.content {
                    post.content = content;
                }
                self.save(post, input.tag_ids.as_deref()).await
            }
        }
    }

    /// Delete a post from the admin
    pub async fn admin_destroy(&self, actor: &Actor, id: i64) -> Result<(), PostServiceError> {
        let (post, blog) = self.get_scoped(admin_post_scope(actor), id).await?;
        authorize_post_destroy(actor, &blog)?;

        self.delete(post.id).await
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    /// Load a post and its blog, treating anything outside `scope` as missing
    async fn get_scoped(&self, scope: PostScope, id: i64) -> Result<(Post, Blog), PostServiceError> {
        let not_found = || PostServiceError::NotFound(id.to_string());

        let post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?
            .ok_or_else(not_found)?;
        let blog = match self.blogs.get(post.blog_id).await {
            Ok(blog) => blog,
            Err(BlogServiceError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        if !PostFilter::new(scope).matches(blog.id, blog.user_id) {
            return Err(not_found());
        }
        Ok((post, blog))
    }

    async fn save(&self, post: Post, tag_ids: Option<&[i64]>) -> Result<PostWithTags, PostServiceError> {
        if let Some(tag_ids) = tag_ids {
            self.tags.ensure_exist(tag_ids).await?;
        }

        let updated = self.repo.update(&post).await.context("Failed to update post")?;
        if let Some(tag_ids) = tag_ids {
            self.tags.set_post_tags(updated.id, tag_ids).await?;
        }
        self.with_tags(updated).await
    }

    async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        self.repo.delete(id).await.context("Failed to delete post")?;
        tracing::info!(post_id = id, "Deleted post");
        Ok(())
    }

    async fn with_tags(&self, post: Post) -> Result<PostWithTags, PostServiceError> {
        let tags = self.tags.get_by_post_id(post.id).await?;
        Ok(PostWithTags { post, tags })
    }
}

fn validate_title(title: &str) -> Result<String, PostServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PostServiceError::ValidationError(
            "Post title cannot be empty".to_string(),
        ));
    }
    Ok(title.to_string())
}
