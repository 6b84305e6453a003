//! Constants for the taskdeck API
//!
//! Response messages are part of the public contract with existing clients
//! and must not change wording.

// ============================================================================
// RESPONSE MESSAGES
// ============================================================================

pub const MSG_TASK_CREATED: &str = "task created!";
pub const MSG_TASK_UPDATED: &str = "Updated !!!";
pub const MSG_TASK_DELETED: &str = "Deleted !!!";
pub const MSG_USER_CREATED: &str = "user created!";
pub const MSG_UP_AND_RUNNING: &str = "Up and running!";

pub const MSG_EMPTY_TITLE: &str = "Task's title can't be empty !!!";
pub const MSG_INVALID_TASK_ID: &str = "invalid taskID";
pub const MSG_FETCH_FAILED: &str = "Failed to fetch tasks";
pub const MSG_CREATE_FAILED: &str = "Failed to create task";
pub const MSG_DELETE_FAILED: &str = "Failed to delete task";
pub const MSG_WRONG_CREDENTIALS: &str = "Wrong password or username !!!";
pub const MSG_USERNAME_TAKEN: &str = "Username already exists";

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Number of random bytes in a generated API key.
pub const API_KEY_BYTES: usize = 32;

/// Minimum username and password length at signup.
pub const MIN_SIGNUP_FIELD_LENGTH: usize = 6;

/// Minimum username and password length at login.
pub const MIN_LOGIN_FIELD_LENGTH: usize = 2;

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// LOGGING
// ============================================================================

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "taskdeck_api=debug,taskdeck_storage=debug,tower_http=info,info";
