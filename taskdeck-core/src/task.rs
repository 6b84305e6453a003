//! The task record and its creation input.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{TaskId, UserId};

/// Status assigned to every newly created task.
pub const INITIAL_STATUS: &str = "To Do";

/// The unit of work tracked by the system.
///
/// `task_id` and `user_id` never change once assigned. `status` is free-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Task {
    #[serde(rename = "taskID")]
    pub task_id: TaskId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

impl Task {
    /// A task must keep a non-empty title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(&self.title)
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(&self.title)
    }

    /// Build the task this request describes, with a fresh id and the
    /// initial status.
    pub fn into_task(self, user_id: UserId) -> Task {
        Task {
            task_id: TaskId::now_v7(),
            user_id,
            title: self.title,
            description: self.description,
            status: INITIAL_STATUS.to_string(),
        }
    }
}

fn require_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
    }
    Ok(())
}
