//! The user record backing bearer-token authentication.

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// A registered principal. Never serialized to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub username: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}
