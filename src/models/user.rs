use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored account. Kept in the `users` collection keyed by username.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    /// Password digest, never the plain password.
    pub password: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A user without the password digest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_ROLE: &str = "user";

impl User {
    pub fn new(
        id: String,
        username: String,
        password_hash: String,
        email: Option<String>,
        role: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password: password_hash,
            email: email.map(|e| e.trim().to_string()).unwrap_or_default(),
            role: role
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            created_at: now,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
