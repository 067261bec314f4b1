//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod blog;
pub mod post;
pub mod tag;
pub mod token;
pub mod user;

pub use blog::{BlogRepository, SqlxBlogRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{SqlxUserRepository, UserRepository};
