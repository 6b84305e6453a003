//! taskdeck Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! task and user records, typed identifiers, table/field names of the
//! durable store, and the error taxonomy. This crate performs no I/O.

pub mod error;
pub mod identity;
pub mod schema;
pub mod task;
pub mod user;

pub use error::{
    CodecError, ConfigError, StoreError, TaskdeckError, TaskdeckResult, ValidationError,
};
pub use identity::{hash_password, verify_password, TaskId, UserId};
pub use schema::{
    task_fields, user_fields, API_KEY_INDEX, TASKS_TABLE, TASK_FIELDS, USERS_TABLE,
};
pub use task::{CreateTask, Task, INITIAL_STATUS};
pub use user::User;
