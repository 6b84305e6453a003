//! OpenAPI Specification for the taskdeck API

use taskdeck_core::{CreateTask, Task};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{CacheHealth, HealthResponse};
use crate::routes::{health, tasks, users};
use crate::services::Credentials;

/// OpenAPI document for the taskdeck API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "taskdeck API",
        description = "Per-user task lists backed by DynamoDB with an in-process read-through cache",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    paths(
        health::up,
        health::readiness,
        users::signup,
        users::login,
        tasks::list_tasks,
        tasks::create_task,
        tasks::edit_task,
        tasks::delete_task,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        Task,
        CreateTask,
        Credentials,
        HealthResponse,
        CacheHealth,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Users", description = "Signup and login"),
        (name = "Tasks", description = "Task list, create, edit and delete"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("API key returned by /login"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
