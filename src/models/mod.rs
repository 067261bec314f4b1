//! Data models
//!
//! This module contains the data structures used throughout blogcms:
//! - Database entities (User, Blog, Post, Tag, Token)
//! - Create/update inputs accepted by the services

mod blog;
mod post;
mod tag;
mod token;
mod user;

pub use blog::{Blog, CreateBlogInput, UpdateBlogInput, DEFAULT_BLOG_DESCRIPTION};
pub use post::{CreatePostInput, Post, PostWithTags, UpdatePostInput};
pub use tag::{Tag, TagInput};
pub use token::Token;
pub use user::User;
