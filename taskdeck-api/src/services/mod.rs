//! Service Layer
//!
//! Business logic behind the HTTP handlers. Services own the store client
//! and the task cache and keep the two in step; handlers only translate
//! between HTTP and service calls.

mod task_service;
mod user_service;

pub use task_service::*;
pub use user_service::*;
