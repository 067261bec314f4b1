//! Post listing scopes
//!
//! A [`PostFilter`] describes which posts a listing may return; repositories
//! translate it into SQL.
//!
//! The admin and public API scopes disagree on anonymous callers: the admin
//! shows them nothing while the public API shows them every post. Both
//! behaviours are kept as they are; do not merge the two functions.

use super::Actor;

/// Which posts an actor may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// No posts at all
    Nothing,
    /// Every post
    All,
    /// Posts on blogs owned by this user
    OwnedBy(i64),
}

/// A scope plus an optional single-blog restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: PostScope,
    pub blog_id: Option<i64>,
}

impl PostFilter {
    pub fn new(scope: PostScope) -> Self {
        Self { scope, blog_id: None }
    }

    pub fn with_blog(mut self, blog_id: i64) -> Self {
        self.blog_id = Some(blog_id);
        self
    }

    /// Whether a post on `blog_id`, owned by `owner_id`, passes this filter
    pub fn matches(&self, blog_id: i64, owner_id: i64) -> bool {
        let in_scope = match self.scope {
            PostScope::Nothing => false,
            PostScope::All => true,
            PostScope::OwnedBy(user_id) => owner_id == user_id,
        };
        in_scope && self.blog_id.map_or(true, |id| id == blog_id)
    }
}

/// Admin listing: anonymous sees nothing, superuser sees all, others their own
pub fn admin_post_scope(actor: &Actor) -> PostScope {
    match actor {
        Actor::Anonymous => PostScope::Nothing,
        Actor::User(user) if user.is_superuser => PostScope::All,
        Actor::User(user) => PostScope::OwnedBy(user.id),
    }
}

/// Public API listing: anonymous sees everything, superuser sees all,
/// others only their own
pub fn viewset_post_scope(actor: &Actor) -> PostScope {
    match actor {
        Actor::Anonymous => PostScope::All,
        Actor::User(user) if user.is_superuser => PostScope::All,
        Actor::User(user) => PostScope::OwnedBy(user.id),
    }
}

/// Narrow `filter` to the blog named by the `blog_id` query parameter.
///
/// A missing or blank parameter leaves the filter unchanged; anything that is
/// not an integer is rejected.
pub fn filter_posts_by_blog(filter: PostFilter, blog_id: Option<&str>) -> Result<PostFilter, String> {
    match blog_id.map(str::trim) {
        None | Some("") => Ok(filter),
        Some(raw) => raw
            .parse::<i64>()
            .map(|id| filter.with_blog(id))
            .map_err(|_| format!("Invalid blog_id: {}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn actor(id: i64, is_superuser: bool) -> Actor {
        let mut user = User::new(format!("user{}", id), String::new(), String::new(), is_superuser);
        user.id = id;
        Actor::User(user)
    }

    #[test]
    fn test_admin_scope() {
        assert_eq!(admin_post_scope(&Actor::Anonymous), PostScope::Nothing);
        assert_eq!(admin_post_scope(&actor(1, true)), PostScope::All);
        assert_eq!(admin_post_scope(&actor(3, false)), PostScope::OwnedBy(3));
    }

    #[test]
    fn test_viewset_scope_anonymous_sees_everything() {
        assert_eq!(viewset_post_scope(&Actor::Anonymous), PostScope::All);
        assert_eq!(viewset_post_scope(&actor(1, true)), PostScope::All);
        assert_eq!(viewset_post_scope(&actor(3, false)), PostScope::OwnedBy(3));
    }

    #[test]
    fn test_filter_matches_owner_example() {
        // A (id 1) owns blog 10, C (id 2) owns blog 20
        let as_a = PostFilter::new(viewset_post_scope(&actor(1, false)));
        assert!(as_a.matches(10, 1));
        assert!(!as_a.matches(20, 2));

        let as_admin = PostFilter::new(viewset_post_scope(&actor(5, true)));
        assert!(as_admin.matches(10, 1));
        assert!(as_admin.matches(20, 2));
    }

    #[test]
    fn test_filter_posts_by_blog() {
        let base = PostFilter::new(PostScope::All);

        assert_eq!(filter_posts_by_blog(base, None), Ok(base));
        assert_eq!(filter_posts_by_blog(base, Some("  ")), Ok(base));

        let narrowed = filter_posts_by_blog(base, Some("10")).unwrap();
        assert_eq!(narrowed.blog_id, Some(10));
        assert!(narrowed.matches(10, 1));
        assert!(!narrowed.matches(20, 1));

        assert!(filter_posts_by_blog(base, Some("ten")).is_err());
    }

    #[test]
    fn test_nothing_scope_never_matches() {
        let filter = PostFilter::new(PostScope::Nothing).with_blog(10);
        assert!(!filter.matches(10, 1));
    }
}
