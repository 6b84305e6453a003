//! Authentication for the taskdeck API
//!
//! Callers present an API key as `Authorization: Bearer <apiKey>`. The key is
//! resolved to its owner through the `apiKey-index` of the users table.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use serde_json::Value;
use taskdeck_core::{user_fields, CodecError, StoreError, UserId, API_KEY_INDEX};
use taskdeck_storage::{user_from_record, StoreClient};
use thiserror::Error;

use crate::constants::API_KEY_BYTES;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller, injected into request extensions by the auth
/// middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
}

impl AuthContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingCredentials,

    #[error("Authorization header does not use the Bearer scheme")]
    InvalidScheme,

    #[error("No user owns the presented API key")]
    UnknownKey,

    #[error("Identity lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Stored user could not be decoded: {0}")]
    Codec(#[from] CodecError),
}

/// Resolves an API key to the id of the user it was issued to.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    async fn resolve(&self, token: &str) -> Result<UserId, AuthError>;
}

/// [`IdentityResolver`] backed by the users table.
pub struct StoreIdentityResolver<S: StoreClient + ?Sized> {
    store: Arc<S>,
    users_table: String,
}

impl<S: StoreClient + ?Sized> StoreIdentityResolver<S> {
    pub fn new(store: Arc<S>, users_table: &str) -> Self {
        Self {
            store,
            users_table: users_table.to_string(),
        }
    }
}

#[async_trait]
impl<S: StoreClient + ?Sized> IdentityResolver for StoreIdentityResolver<S> {
    async fn resolve(&self, token: &str) -> Result<UserId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::UnknownKey);
        }

        let mut records = self
            .store
            .query_index(
                &self.users_table,
                API_KEY_INDEX,
                user_fields::API_KEY,
                &Value::String(token.to_string()),
                Some(1),
            )
            .await?;

        match records.pop() {
            Some(record) => Ok(user_from_record(record)?.user_id),
            None => {
                tracing::debug!("No user found for presented API key");
                Err(AuthError::UnknownKey)
            }
        }
    }
}

/// Pull the token out of an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredentials)?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::InvalidScheme)
}

/// Fresh API key: random bytes, URL-safe base64 with padding.
pub fn generate_api_key() -> String {
    let mut key = [0u8; API_KEY_BYTES];
    rand::rng().fill_bytes(&mut key);
    URL_SAFE.encode(key)
}
