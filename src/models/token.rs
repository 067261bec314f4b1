//! API token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication token. Each user holds at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token key presented as `Authorization: Token <key>`
    pub key: String,
    /// Owning user
    pub user_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Issue a fresh token for a user
    pub fn generate(user_id: i64) -> Self {
        Self {
            key: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
