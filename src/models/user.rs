//! User model
//!
//! This module defines the User entity for the blogcms server.
//! A user owns at most one blog; superusers bypass every ownership check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Unrestricted access, bypassing ownership checks
    pub is_superuser: bool,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active User.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(username: String, email: String, password_hash: String, is_superuser: bool) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            is_superuser,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hashed_password".to_string(),
            false,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "testuser");
        assert!(!user.is_superuser);
        assert!(user.is_active);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("u".to_string(), "u@x.com".to_string(), "secret".to_string(), true);
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["is_superuser"], true);
    }
}
