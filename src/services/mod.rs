//! Services layer - Business logic
//!
//! Services validate input, apply the rules in [`crate::policy`] to the
//! acting user, and coordinate the repositories.

pub mod blog;
pub mod password;
pub mod post;
pub mod tag;
pub mod user;

pub use blog::{BlogService, BlogServiceError};
pub use password::{hash_password, verify_password};
pub use post::{AdminPostForm, AdminPostInput, PostService, PostServiceError, ADMIN_POST_READONLY_FIELDS};
pub use tag::{generate_tag_slug, TagService, TagServiceError};
pub use user::{RegisterInput, UserService, UserServiceError, INVALID_CREDENTIALS};
