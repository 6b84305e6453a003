//! taskdeck API - HTTP layer
//!
//! Axum routes for signup, login and per-user task management. Task reads go
//! through an in-process read-through cache; writes go to the store first
//! and are then mirrored into the cache.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    bearer_token, generate_api_key, AuthContext, AuthError, IdentityResolver,
    StoreIdentityResolver,
};
pub use config::{ApiConfig, LogConfig, LogFormat, ServerConfig, StoreBackend, StoreConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use services::{
    Credentials, TaskOperation, TaskService, TaskServiceError, UserService, UserServiceError,
};
pub use state::{connect_store, AppState};
