//! Blog service
//!
//! Each user owns at most one blog. Listing and reading are public; only the
//! owner or a superuser may change or delete a blog.

use crate::db::repositories::BlogRepository;
use crate::models::{Blog, CreateBlogInput, UpdateBlogInput, User, DEFAULT_BLOG_DESCRIPTION};
use crate::policy::{authorize_blog_destroy, authorize_blog_update, default_blog_title, Actor, PolicyError};
use anyhow::Context;
use std::sync::Arc;

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    /// Blog not found
    #[error("Blog not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The user already owns a blog
    #[error("{0}")]
    Conflict(String),

    /// Rejected by the ownership rules
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Blog service
pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Blog>, BlogServiceError> {
        let blogs = self.repo.list().await.context("Failed to list blogs")?;
        Ok(blogs)
    }

    pub async fn get(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get blog by ID")?
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))
    }

    /// Create a blog owned by the acting user
    pub async fn create(&self, actor: &Actor, input: CreateBlogInput) -> Result<Blog, BlogServiceError> {
        let user = actor
            .user()
            .ok_or_else(|| PolicyError::not_authenticated("Authentication credentials were not provided."))?;
        let title = validate_title(&input.title)?;

        if self.for_user(user.id).await?.is_some() {
            return Err(BlogServiceError::Conflict(format!(
                "User '{}' already has a blog",
                user.username
            )));
        }

        let blog = match self.repo.create(&Blog::new(user.id, title, input.description)).await {
            Ok(blog) => blog,
            // A concurrent create for the same user won the unique owner slot
            Err(err) => {
                return match self.for_user(user.id).await? {
                    Some(_) => Err(BlogServiceError::Conflict(format!(
                        "User '{}' already has a blog",
                        user.username
                    ))),
                    None => Err(BlogServiceError::InternalError(err.context("Failed to create blog"))),
                };
            }
        };
        tracing::info!(blog_id = blog.id, user_id = user.id, "Created blog");
        Ok(blog)
    }

    /// Update a blog. Nothing is written unless the actor owns it or is a
    /// superuser.
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        input: UpdateBlogInput,
    ) -> Result<Blog, BlogServiceError> {
        let mut blog = self.get(id).await?;
        authorize_blog_update(actor, &blog)?;

        if let Some(title) = &input.title {
            validate_title(title)?;
        }
        input.apply_to(&mut blog);
        blog.title = blog.title.trim().to_string();

        let updated = self.repo.update(&blog).await.context("Failed to update blog")?;
        Ok(updated)
    }

    /// Delete a blog together with its posts
    pub async fn destroy(&self, actor: &Actor, id: i64) -> Result<(), BlogServiceError> {
        let blog = self.get(id).await?;
        authorize_blog_destroy(actor, &blog)?;

        self.repo.delete(id).await.context("Failed to delete blog")?;
        tracing::info!(blog_id = id, "Deleted blog");
        Ok(())
    }

    /// The blog owned by `user_id`, if any
    pub async fn for_user(&self, user_id: i64) -> Result<Option<Blog>, BlogServiceError> {
        let blog = self
            .repo
            .get_by_user(user_id)
            .await
            .context("Failed to get blog by user")?;
        Ok(blog)
    }

    /// The user's blog, provisioning a default one if they have none
    pub async fn get_or_provision(&self, user: &User) -> Result<Blog, BlogServiceError> {
        if let Some(blog) = self.for_user(user.id).await? {
            return Ok(blog);
        }

        let blog = Blog::new(
            user.id,
            default_blog_title(&user.username),
            DEFAULT_BLOG_DESCRIPTION.to_string(),
        );
        match self.repo.create(&blog).await {
            Ok(created) => {
                tracing::info!(blog_id = created.id, user_id = user.id, "Provisioned default blog");
                Ok(created)
            }
            // Lost a race against a concurrent first post by the same user
            Err(err) => match self.for_user(user.id).await? {
                Some(existing) => Ok(existing),
                None => Err(BlogServiceError::InternalError(
                    err.context("Failed to provision blog"),
                )),
            },
        }
    }
}

fn validate_title(title: &str) -> Result<String, BlogServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BlogServiceError::ValidationError(
            "Blog title cannot be empty".to_string(),
        ));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxBlogRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, BlogService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = BlogService::new(SqlxBlogRepository::boxed(pool.clone()));
        (pool, service)
    }

    async fn create_user(pool: &DynDatabasePool, name: &str, is_superuser: bool) -> User {
        SqlxUserRepository::new(pool.clone())
            .create(&User::new(name.to_string(), String::new(), "hash".to_string(), is_superuser))
            .await
            .unwrap()
    }

    fn create_input(title: &str) -> CreateBlogInput {
        CreateBlogInput {
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_authentication() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create(&Actor::Anonymous, create_input("Mine")).await;
        assert!(matches!(
            result,
            Err(BlogServiceError::Policy(PolicyError::NotAuthenticated(_)))
        ));
    }

    #[tokio::test]
    async fn test_second_blog_conflicts() {
        let (pool, service) = setup_test_service().await;
        let actor = Actor::from(create_user(&pool, "alice", false).await);

        let blog = service.create(&actor, create_input("  Mine  ")).await.unwrap();
        assert_eq!(blog.title, "Mine");
        assert_eq!(blog.user_id, actor.user_id().unwrap());

        let second = service.create(&actor, create_input("Another")).await;
        assert!(matches!(second, Err(BlogServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_creates_conflict() {
        let (pool, service) = setup_test_service().await;
        let actor = Actor::from(create_user(&pool, "alice", false).await);

        let (a, b) = tokio::join!(
            service.create(&actor, create_input("First")),
            service.create(&actor, create_input("Second"))
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(BlogServiceError::Conflict(_)))));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_owner_update_is_denied_without_mutation() {
        let (pool, service) = setup_test_service().await;
        let owner = Actor::from(create_user(&pool, "alice", false).await);
        let intruder = Actor::from(create_user(&pool, "mallory", false).await);
        let blog = service.create(&owner, create_input("Original")).await.unwrap();

        let update = UpdateBlogInput {
            title: Some("Hijacked".to_string()),
            description: None,
        };
        match service.update(&intruder, blog.id, update).await {
            Err(BlogServiceError::Policy(PolicyError::PermissionDenied(message))) => {
                assert_eq!(message, "Only the owner of the blog can edit it")
            }
            other => panic!("expected PermissionDenied, got {:?}", other.map(|b| b.id)),
        }

        assert_eq!(service.get(blog.id).await.unwrap().title, "Original");
    }

    #[tokio::test]
    async fn test_non_owner_destroy_is_denied() {
        let (pool, service) = setup_test_service().await;
        let owner = Actor::from(create_user(&pool, "alice", false).await);
        let intruder = Actor::from(create_user(&pool, "mallory", false).await);
        let blog = service.create(&owner, create_input("Original")).await.unwrap();

        match service.destroy(&intruder, blog.id).await {
            Err(BlogServiceError::Policy(PolicyError::PermissionDenied(message))) => {
                assert_eq!(message, "Only the owner of the blog can delete it")
            }
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
        assert!(service.get(blog.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_superuser_may_update_and_destroy_any_blog() {
        let (pool, service) = setup_test_service().await;
        let owner = Actor::from(create_user(&pool, "alice", false).await);
        let admin = Actor::from(create_user(&pool, "root", true).await);
        let blog = service.create(&owner, create_input("Original")).await.unwrap();

        let updated = service
            .update(
                &admin,
                blog.id,
                UpdateBlogInput {
                    title: None,
                    description: Some("Moderated".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.description, "Moderated");

        service.destroy(&admin, blog.id).await.unwrap();
        assert!(matches!(service.get(blog.id).await, Err(BlogServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_or_provision_creates_once() {
        let (pool, service) = setup_test_service().await;
        let user = create_user(&pool, "alice", false).await;

        let first = service.get_or_provision(&user).await.unwrap();
        assert_eq!(first.title, "Blog de alice");
        assert_eq!(first.description, "Blog personal");

        let second = service.get_or_provision(&user).await.unwrap();
        assert_eq!(second.id, first.id);
    }
}
