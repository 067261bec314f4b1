//! Authorization policy
//!
//! Every access decision in blogcms is made here, as plain functions over an
//! [`Actor`] and the resource it acts on. Nothing in this module touches HTTP
//! or the database, so each rule can be tested on its own:
//! - [`permissions`]: per-action permission tables for the viewsets
//! - [`ownership`]: owner-or-superuser checks for blogs and posts
//! - [`scope`]: which posts a listing may return
//! - [`admin`]: read-only fields and blog choices for the admin post form

mod actor;
pub mod admin;
pub mod ownership;
pub mod permissions;
pub mod scope;

pub use actor::Actor;
pub use admin::{limit_blog_choices, readonly_fields, BLOG_FIELD};
pub use ownership::{
    authorize_admin_post_save, authorize_blog_destroy, authorize_blog_update,
    authorize_post_create, authorize_post_destroy, authorize_post_update, can_add_post,
    can_edit_blog, can_edit_post, default_blog_title,
};
pub use permissions::{Action, PermissionClass, PermissionPolicy};
pub use scope::{admin_post_scope, filter_posts_by_blog, viewset_post_scope, PostFilter, PostScope};

/// Outcome of a failed policy check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The caller must authenticate first
    #[error("{0}")]
    NotAuthenticated(String),

    /// The caller is known but not allowed
    #[error("{0}")]
    PermissionDenied(String),
}

impl PolicyError {
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::NotAuthenticated(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }
}
