//! Per-action permission tables
//!
//! A viewset answers "may this actor attempt this action at all?" by looking
//! the action up in a [`PermissionPolicy`]. Every class listed for the action
//! must grant access.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{Actor, PolicyError};

/// Standard viewset action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::PartialUpdate,
        Action::Destroy,
    ];

    /// Actions that only read
    pub fn is_read(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Action::List),
            "retrieve" => Ok(Action::Retrieve),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "partial_update" => Ok(Action::PartialUpdate),
            "destroy" => Ok(Action::Destroy),
            _ => Err(anyhow::anyhow!("Unknown action: {}", s)),
        }
    }
}

/// Request-level permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionClass {
    /// Anyone, including anonymous callers
    AllowAny,
    /// Authenticated users only
    IsAuthenticated,
}

impl PermissionClass {
    pub fn has_permission(&self, actor: &Actor) -> bool {
        match self {
            PermissionClass::AllowAny => true,
            PermissionClass::IsAuthenticated => actor.is_authenticated(),
        }
    }
}

/// Table of permission classes keyed by action
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    rules: HashMap<Action, Vec<PermissionClass>>,
    fallback: Vec<PermissionClass>,
}

impl PermissionPolicy {
    /// Policy where actions without an explicit rule use `fallback`
    pub fn with_fallback(fallback: Vec<PermissionClass>) -> Self {
        Self {
            rules: HashMap::new(),
            fallback,
        }
    }

    /// Set the classes for one action
    pub fn rule(mut self, action: Action, classes: Vec<PermissionClass>) -> Self {
        self.rules.insert(action, classes);
        self
    }

    /// Anyone may list and retrieve; every other action needs a logged-in user.
    pub fn public_read_only() -> Self {
        Action::ALL
            .into_iter()
            .filter(Action::is_read)
            .fold(Self::with_fallback(vec![PermissionClass::IsAuthenticated]), |policy, action| {
                policy.rule(action, vec![PermissionClass::AllowAny])
            })
    }

    /// Blog viewset policy. Request-level checks match [`Self::public_read_only`];
    /// ownership of the target blog is enforced afterwards by
    /// [`super::authorize_blog_update`] and [`super::authorize_blog_destroy`].
    pub fn blog_owner() -> Self {
        Self::public_read_only()
    }

    /// Permission classes that apply to `action`
    pub fn permissions_for(&self, action: Action) -> &[PermissionClass] {
        self.rules
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or(self.fallback.as_slice())
    }

    pub fn allows(&self, action: Action, actor: &Actor) -> bool {
        self.permissions_for(action)
            .iter()
            .all(|class| class.has_permission(actor))
    }

    /// Fail with `NotAuthenticated` when the actor may not attempt `action`
    pub fn check(&self, action: Action, actor: &Actor) -> Result<(), PolicyError> {
        if self.allows(action, actor) {
            Ok(())
        } else {
            Err(PolicyError::not_authenticated(
                "Authentication credentials were not provided.",
            ))
        }
    }
}
