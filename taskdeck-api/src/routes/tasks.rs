//! Task endpoints. All require authentication.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use taskdeck_core::{CreateTask, Task, TaskId};
use tokio_util::sync::CancellationToken;

use crate::constants::{MSG_TASK_CREATED, MSG_TASK_DELETED, MSG_TASK_UPDATED};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::state::SharedTaskService;

/// GET /tasks - List the caller's tasks
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    responses(
        (status = 200, description = "Tasks owned by the caller", body = Vec<Task>),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Failed to fetch tasks", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(tasks): State<SharedTaskService>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<Task>>> {
    // Dropped with the request, so a disconnected client stops its fill.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let listed = tasks.list(auth.user_id, cancel).await?;
    Ok(Json(listed))
}

/// POST /task - Create a task
#[utoipa::path(
    post,
    path = "/task",
    tag = "Tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created", body = String),
        (status = 400, description = "Empty title or malformed body", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Failed to create task", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(tasks): State<SharedTaskService>,
    AuthExtractor(auth): AuthExtractor,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<&'static str>)> {
    let Json(request) = payload?;
    tasks.create(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(MSG_TASK_CREATED)))
}

/// PUT /task - Replace a task's title, description and status
#[utoipa::path(
    put,
    path = "/task",
    tag = "Tasks",
    request_body = Task,
    responses(
        (status = 200, description = "Task updated", body = String),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Task belongs to another user", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit_task(
    State(tasks): State<SharedTaskService>,
    AuthExtractor(auth): AuthExtractor,
    payload: Result<Json<Task>, JsonRejection>,
) -> ApiResult<Json<&'static str>> {
    let Json(task) = payload?;
    tasks.edit(auth.user_id, task).await?;
    Ok(Json(MSG_TASK_UPDATED))
}

/// DELETE /task/{taskID} - Delete a task
#[utoipa::path(
    delete,
    path = "/task/{taskID}",
    tag = "Tasks",
    params(
        ("taskID" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted", body = String),
        (status = 400, description = "invalid taskID", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Task belongs to another user", body = ApiError),
        (status = 500, description = "Failed to delete task", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(tasks): State<SharedTaskService>,
    AuthExtractor(auth): AuthExtractor,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<&'static str>> {
    let task_id: TaskId = raw_id.trim().parse()?;
    tasks.delete(auth.user_id, task_id).await?;
    Ok(Json(MSG_TASK_DELETED))
}
