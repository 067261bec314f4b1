//! Admin post form rules

use crate::models::Blog;

use super::Actor;

/// Name of the post field that points at its blog
pub const BLOG_FIELD: &str = "blog";

/// Read-only fields of the post form.
///
/// Editing an existing post as anyone but a superuser locks its blog.
pub fn readonly_fields(actor: &Actor, base: &[&str], editing_existing: bool) -> Vec<String> {
    let mut fields: Vec<String> = base.iter().map(|f| f.to_string()).collect();
    if editing_existing && !actor.is_superuser() && !fields.iter().any(|f| f == BLOG_FIELD) {
        fields.push(BLOG_FIELD.to_string());
    }
    fields
}

/// Blogs offered in the post form's blog selector
pub fn limit_blog_choices(actor: &Actor, blogs: Vec<Blog>) -> Vec<Blog> {
    if actor.is_superuser() {
        return blogs;
    }
    match actor.user_id() {
        Some(user_id) => blogs.into_iter().filter(|b| b.user_id == user_id).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use proptest::prelude::*;

    fn actor(id: i64, is_superuser: bool) -> Actor {
        let mut user = User::new(format!("user{}", id), String::new(), String::new(), is_superuser);
        user.id = id;
        Actor::User(user)
    }

    fn blog(id: i64, owner: i64) -> Blog {
        let mut blog = Blog::new(owner, format!("Blog {}", id), String::new());
        blog.id = id;
        blog
    }

    #[test]
    fn test_readonly_fields_non_superuser_existing() {
        let fields = readonly_fields(&actor(1, false), &[], true);
        assert!(fields.contains(&"blog".to_string()));
    }

    #[test]
    fn test_readonly_fields_superuser() {
        let fields = readonly_fields(&actor(1, true), &[], true);
        assert!(!fields.contains(&"blog".to_string()));
    }

    #[test]
    fn test_readonly_fields_new_object() {
        let fields = readonly_fields(&actor(1, false), &[], false);
        assert!(!fields.contains(&"blog".to_string()));
    }

    #[test]
    fn test_readonly_fields_keeps_base_and_no_duplicates() {
        let fields = readonly_fields(&actor(1, false), &["created_at", "blog"], true);
        assert_eq!(fields, vec!["created_at".to_string(), "blog".to_string()]);
    }

    #[test]
    fn test_limit_blog_choices() {
        let blogs = vec![blog(10, 1), blog(20, 2), blog(30, 1)];

        let mine: Vec<i64> = limit_blog_choices(&actor(1, false), blogs.clone()).iter().map(|b| b.id).collect();
        assert_eq!(mine, vec![10, 30]);

        assert_eq!(limit_blog_choices(&actor(9, true), blogs.clone()).len(), 3);
        assert!(limit_blog_choices(&Actor::Anonymous, blogs).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_blog_readonly_iff_non_superuser_editing(is_superuser in any::<bool>(), existing in any::<bool>()) {
            let fields = readonly_fields(&actor(1, is_superuser), &["created_at"], existing);
            prop_assert_eq!(fields.iter().any(|f| f == "blog"), existing && !is_superuser);
            prop_assert!(fields.iter().any(|f| f == "created_at"));
        }
    }
}
