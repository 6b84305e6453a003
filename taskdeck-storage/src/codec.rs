//! Conversions between typed entities and store records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use taskdeck_core::{task_fields, user_fields, CodecError, Task, TaskId, User, UserId};

use crate::store::Record;

fn to_record<T: Serialize>(entity: &str, value: &T) -> Result<Record, CodecError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(CodecError::InvalidField {
            entity: entity.to_string(),
            field: "*".to_string(),
            reason: "entity does not serialize to a map".to_string(),
        }),
        Err(e) => Err(CodecError::InvalidField {
            entity: entity.to_string(),
            field: "*".to_string(),
            reason: e.to_string(),
        }),
    }
}

fn from_record<T: DeserializeOwned>(
    entity: &str,
    required: &[&str],
    record: Record,
) -> Result<T, CodecError> {
    if let Some(missing) = required.iter().find(|field| !record.contains_key(**field)) {
        return Err(CodecError::MissingField {
            entity: entity.to_string(),
            field: missing.to_string(),
        });
    }
    serde_json::from_value(Value::Object(record)).map_err(|e| CodecError::InvalidField {
        entity: entity.to_string(),
        field: "*".to_string(),
        reason: e.to_string(),
    })
}

/// Encode a task as a full store record.
pub fn task_to_record(task: &Task) -> Result<Record, CodecError> {
    to_record("Task", task)
}

/// Decode a store record into a task.
pub fn task_from_record(record: Record) -> Result<Task, CodecError> {
    from_record(
        "Task",
        &[task_fields::TASK_ID, task_fields::USER_ID, task_fields::TITLE],
        record,
    )
}

/// Key attributes of a task record.
pub fn task_key(task_id: TaskId, user_id: UserId) -> Record {
    let mut key = Map::new();
    key.insert(
        task_fields::TASK_ID.to_string(),
        Value::String(task_id.to_string()),
    );
    key.insert(
        task_fields::USER_ID.to_string(),
        Value::String(user_id.to_string()),
    );
    key
}

/// The mutable attributes of a task, for partial updates.
pub fn task_mutable_fields(task: &Task) -> Record {
    let mut fields = Map::new();
    fields.insert(
        task_fields::TITLE.to_string(),
        Value::String(task.title.clone()),
    );
    fields.insert(
        task_fields::DESCRIPTION.to_string(),
        Value::String(task.description.clone()),
    );
    fields.insert(
        task_fields::STATUS.to_string(),
        Value::String(task.status.clone()),
    );
    fields
}

pub fn user_to_record(user: &User) -> Result<Record, CodecError> {
    to_record("User", user)
}

pub fn user_from_record(record: Record) -> Result<User, CodecError> {
    from_record(
        "User",
        &[
            user_fields::USER_ID,
            user_fields::USERNAME,
            user_fields::PASSWORD_HASH,
            user_fields::API_KEY,
        ],
        record,
    )
}

/// Key attributes of a user record.
pub fn user_key(username: &str) -> Record {
    let mut key = Map::new();
    key.insert(
        user_fields::USERNAME.to_string(),
        Value::String(username.to_string()),
    );
    key
}
