//! The party on whose behalf a request runs

use crate::models::User;

/// Either an anonymous caller or an authenticated user
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User(User),
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    /// Anonymous callers are never superusers
    pub fn is_superuser(&self) -> bool {
        matches!(self, Actor::User(user) if user.is_superuser)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Actor::User(user) => Some(user),
            Actor::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Actor::User(user)
    }
}

impl From<Option<User>> for Actor {
    fn from(user: Option<User>) -> Self {
        user.map_or(Actor::Anonymous, Actor::User)
    }
}
