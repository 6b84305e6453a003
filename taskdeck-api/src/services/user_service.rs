//! User Service
//!
//! Signup and login. Users are keyed by username; each carries the API key
//! that authenticates its task requests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taskdeck_core::{
    hash_password, verify_password, CodecError, StoreError, User, UserId, ValidationError,
};
use taskdeck_storage::{user_from_record, user_key, user_to_record, StoreClient};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::generate_api_key;
use crate::constants::{MIN_LOGIN_FIELD_LENGTH, MIN_SIGNUP_FIELD_LENGTH};

/// Body of `POST /signup` and `POST /login`.
///
/// Minimum lengths count Unicode characters, not bytes, so `"héllo!"` is six
/// long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn require_min_length(&self, min: usize) -> Result<(), ValidationError> {
        for (field, value) in [("username", &self.username), ("password", &self.password)] {
            if value.chars().count() < min {
                return Err(ValidationError::TooShort {
                    field: field.to_string(),
                    min,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Invalid credentials: {0}")]
    Validation(#[from] ValidationError),

    #[error("Username {username} is already registered")]
    UsernameTaken { username: String },

    #[error("Wrong password or username")]
    InvalidCredentials,

    #[error("User store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("User record is malformed: {0}")]
    Codec(#[from] CodecError),
}

pub struct UserService<S: StoreClient + ?Sized> {
    store: Arc<S>,
    table: String,
}

impl<S: StoreClient + ?Sized> UserService<S> {
    pub fn new(store: Arc<S>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    /// Register a new user and issue its API key.
    ///
    /// The existence check and the write are separate store calls; two
    /// concurrent signups for one username can both pass the check.
    pub async fn signup(&self, credentials: Credentials) -> Result<User, UserServiceError> {
        credentials.require_min_length(MIN_SIGNUP_FIELD_LENGTH)?;

        if self
            .store
            .get(&self.table, user_key(&credentials.username))
            .await?
            .is_some()
        {
            return Err(UserServiceError::UsernameTaken {
                username: credentials.username,
            });
        }

        let user = User {
            user_id: UserId::now_v7(),
            password_hash: hash_password(&credentials.password),
            username: credentials.username,
            api_key: generate_api_key(),
        };
        self.store.put(&self.table, user_to_record(&user)?).await?;

        tracing::info!(user_id = %user.user_id, username = %user.username, "User created");
        Ok(user)
    }

    /// Check credentials and return the user's API key.
    pub async fn login(&self, credentials: Credentials) -> Result<String, UserServiceError> {
        credentials.require_min_length(MIN_LOGIN_FIELD_LENGTH)?;

        let record = self
            .store
            .get(&self.table, user_key(&credentials.username))
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;
        let user = user_from_record(record)?;

        if !verify_password(&user.password_hash, &credentials.password) {
            tracing::debug!(username = %credentials.username, "Login rejected");
            return Err(UserServiceError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.user_id, "Login succeeded");
        Ok(user.api_key)
    }
}

// =============================================================================
// TESTS
// =============================================================================
