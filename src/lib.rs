//! blogcms - A multi-user blog content API
//!
//! Users own one blog each and publish posts on it. Who may read, write or
//! administer a post is decided by the pure rules in [`policy`]; the
//! [`services`] apply them and the [`api`] exposes them over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod policy;
pub mod services;
