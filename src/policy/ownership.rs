//! Ownership rules for blogs and posts
//!
//! A blog belongs to its user; a post belongs to whoever owns its blog.
//! Superusers pass every check here.

use crate::models::{Blog, User};

use super::{Actor, PolicyError};

/// Title of the blog provisioned for a user's first post
pub fn default_blog_title(username: &str) -> String {
    format!("Blog de {}", username)
}

/// Owner or superuser
pub fn can_edit_blog(user: &User, blog: &Blog) -> bool {
    user.is_superuser || blog.user_id == user.id
}

/// Whether `user` may edit a post published on `post_blog`
pub fn can_edit_post(user: &User, post_blog: &Blog) -> bool {
    can_edit_blog(user, post_blog)
}

/// Whether `user` may publish a new post on `blog`
pub fn can_add_post(user: &User, blog: &Blog) -> bool {
    can_edit_blog(user, blog)
}

/// Gate for updating a blog. The blog is left untouched on `Err`.
pub fn authorize_blog_update(actor: &Actor, blog: &Blog) -> Result<(), PolicyError> {
    authorize_blog_owner(actor, blog, "Only the owner of the blog can edit it")
}

/// Gate for deleting a blog
pub fn authorize_blog_destroy(actor: &Actor, blog: &Blog) -> Result<(), PolicyError> {
    authorize_blog_owner(actor, blog, "Only the owner of the blog can delete it")
}

fn authorize_blog_owner(actor: &Actor, blog: &Blog, denied: &str) -> Result<(), PolicyError> {
    match actor.user() {
        Some(user) if can_edit_blog(user, blog) => Ok(()),
        _ => Err(PolicyError::permission_denied(denied)),
    }
}

/// Creating a post only needs a logged-in user; the target blog is the
/// user's own.
pub fn authorize_post_create(actor: &Actor) -> Result<&User, PolicyError> {
    actor
        .user()
        .ok_or_else(|| PolicyError::not_authenticated("Authentication required to create posts."))
}

pub fn authorize_post_update(actor: &Actor, post_blog: &Blog) -> Result<(), PolicyError> {
    let user = actor
        .user()
        .ok_or_else(|| PolicyError::not_authenticated("Authentication required to edit posts."))?;
    if !can_edit_post(user, post_blog) {
        return Err(PolicyError::permission_denied("You are not allowed to edit this post."));
    }
    Ok(())
}

pub fn authorize_post_destroy(actor: &Actor, post_blog: &Blog) -> Result<(), PolicyError> {
    let user = actor
        .user()
        .ok_or_else(|| PolicyError::not_authenticated("Authentication required to delete posts."))?;
    if !can_edit_post(user, post_blog) {
        return Err(PolicyError::permission_denied("You are not allowed to delete this post."));
    }
    Ok(())
}

/// Save check for the admin post form.
///
/// `target_blog` is the blog the post will be saved on. On change, only a
/// move to another blog (`"blog"` among `changed_fields`) is checked.
pub fn authorize_admin_post_save(
    actor: &Actor,
    target_blog: &Blog,
    change: bool,
    changed_fields: &[&str],
) -> Result<(), PolicyError> {
    let user = actor
        .user()
        .ok_or_else(|| PolicyError::not_authenticated("Authentication required to save posts."))?;
    if user.is_superuser {
        return Ok(());
    }

    if !change {
        if !can_add_post(user, target_blog) {
            return Err(PolicyError::permission_denied("You are not allowed to add this post."));
        }
    } else if changed_fields.contains(&super::BLOG_FIELD) && !can_edit_post(user, target_blog) {
        return Err(PolicyError::permission_denied(
            "You are not allowed to move the post to a blog that is not yours.",
        ));
    }

    Ok(())
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_owner_or_superuser_may_edit(user_id in 1i64..50, owner_id in 1i64..50, is_superuser in any::<bool>()) {
            let mut u = User::new("u".to_string(), String::new(), String::new(), is_superuser);
            u.id = user_id;
            let b = Blog::new(owner_id, "t".to_string(), String::new());

            let expected = is_superuser || user_id == owner_id;
            prop_assert_eq!(can_edit_post(&u, &b), expected);
            prop_assert_eq!(can_add_post(&u, &b), expected);
            prop_assert_eq!(authorize_blog_update(&Actor::User(u.clone()), &b).is_ok(), expected);
            prop_assert_eq!(authorize_blog_destroy(&Actor::User(u), &b).is_ok(), expected);
        }
    }
}
