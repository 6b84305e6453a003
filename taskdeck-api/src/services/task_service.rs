//! Task Service
//!
//! Lists tasks through the read-through cache and applies create, edit and
//! delete by writing the store first and reconciling the cache afterwards.

use std::fmt;
use std::sync::Arc;

use taskdeck_core::{CodecError, CreateTask, StoreError, Task, TaskId, UserId, ValidationError};
use taskdeck_storage::{
    task_key, task_mutable_fields, task_to_record, CacheConfig, FillEngine, FillError, StoreClient,
    TaskCache,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::constants::{MSG_CREATE_FAILED, MSG_DELETE_FAILED};

/// Store write that a task operation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    Create,
    Delete,
}

impl TaskOperation {
    /// Message returned to the caller when the store write fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            TaskOperation::Create => MSG_CREATE_FAILED,
            TaskOperation::Delete => MSG_DELETE_FAILED,
        }
    }
}

impl fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOperation::Create => f.write_str("create"),
            TaskOperation::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("Task validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task {task_id} belongs to another user")]
    Forbidden { task_id: TaskId },

    #[error("Task {operation} failed in store: {source}")]
    Store {
        operation: TaskOperation,
        #[source]
        source: StoreError,
    },

    #[error("Task could not be encoded: {0}")]
    Codec(#[from] CodecError),

    #[error("Task list failed: {0}")]
    Fill(#[from] FillError),
}

/// Coordinates the task store and the task cache.
///
/// Constructed once at startup and shared through the router state.
pub struct TaskService<S: StoreClient + ?Sized> {
    store: Arc<S>,
    cache: Arc<TaskCache>,
    fill: FillEngine<S>,
    table: String,
}

impl<S: StoreClient + ?Sized> TaskService<S> {
    pub fn new(store: Arc<S>, cache: Arc<TaskCache>, table: &str, config: CacheConfig) -> Self {
        let fill = FillEngine::new(Arc::clone(&store), Arc::clone(&cache), table, config);
        Self {
            store,
            cache,
            fill,
            table: table.to_string(),
        }
    }

    pub fn cache(&self) -> &Arc<TaskCache> {
        &self.cache
    }

    /// All tasks owned by `user_id`.
    ///
    /// Served from the cache when it holds any of the user's tasks; otherwise
    /// a fill scans the store and populates the cache as it goes. Cancelling
    /// `cancel` abandons the fill.
    pub async fn list(
        &self,
        user_id: UserId,
        cancel: CancellationToken,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let cached = self.cache.get_all(user_id).await;
        if !cached.is_empty() {
            tracing::debug!(user_id = %user_id, count = cached.len(), "Task list served from cache");
            return Ok(cached);
        }

        tracing::debug!(user_id = %user_id, "Task cache miss, filling from store");
        let tasks = self.fill.spawn(user_id, cancel).collect().await?;
        Ok(tasks)
    }

    /// Create a task for `user_id`.
    ///
    /// Nothing is cached unless the store accepted the write.
    pub async fn create(
        &self,
        user_id: UserId,
        request: CreateTask,
    ) -> Result<Task, TaskServiceError> {
        request.validate()?;
        let task = request.into_task(user_id);
        let record = task_to_record(&task)?;

        self.store
            .put(&self.table, record)
            .await
            .map_err(|source| TaskServiceError::Store {
                operation: TaskOperation::Create,
                source,
            })?;

        self.cache.put(task.clone()).await;
        tracing::info!(task_id = %task.task_id, user_id = %user_id, "Task created");
        Ok(task)
    }

    /// Apply a caller-supplied task.
    ///
    /// The title must stay non-empty. Only `title`, `description` and `status` are written to the store. The
    /// cache is overwritten with `task` whether or not that write succeeded,
    /// so a failed write leaves cache and store disagreeing until the entry
    /// is next replaced.
    pub async fn edit(&self, user_id: UserId, task: Task) -> Result<Task, TaskServiceError> {
        task.validate()?;
        self.ensure_owner(user_id, &task).await?;

        let key = task_key(task.task_id, task.user_id);
        let fields = task_mutable_fields(&task);
        match self.store.update(&self.table, key, fields).await {
            Ok(()) => {
                tracing::info!(task_id = %task.task_id, user_id = %user_id, "Task updated");
            }
            Err(error) => {
                tracing::warn!(
                    task_id = %task.task_id,
                    user_id = %user_id,
                    error = %error,
                    "Task update failed in store; cache overwritten anyway, cache and store diverge"
                );
            }
        }

        self.cache.put(task.clone()).await;
        Ok(task)
    }

    /// Delete `task_id` owned by `user_id`.
    ///
    /// The cache entry is removed only after the store delete succeeds.
    pub async fn delete(&self, user_id: UserId, task_id: TaskId) -> Result<(), TaskServiceError> {
        if let Some(cached) = self.cache.get(task_id).await {
            if cached.user_id != user_id {
                return Err(TaskServiceError::Forbidden { task_id });
            }
        }

        if let Err(source) = self.store.delete(&self.table, task_key(task_id, user_id)).await {
            tracing::warn!(
                task_id = %task_id,
                user_id = %user_id,
                error = %source,
                "Task delete failed in store; cache entry kept"
            );
            return Err(TaskServiceError::Store {
                operation: TaskOperation::Delete,
                source,
            });
        }

        self.cache.delete(task_id).await;
        tracing::info!(task_id = %task_id, user_id = %user_id, "Task deleted");
        Ok(())
    }

    /// Reject a task claimed for another owner, or one whose cached copy
    /// belongs to someone else.
    async fn ensure_owner(&self, user_id: UserId, task: &Task) -> Result<(), TaskServiceError> {
        if task.user_id != user_id {
            return Err(TaskServiceError::Forbidden {
                task_id: task.task_id,
            });
        }
        match self.cache.get(task.task_id).await {
            Some(cached) if cached.user_id != user_id => Err(TaskServiceError::Forbidden {
                task_id: task.task_id,
            }),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use taskdeck_core::{INITIAL_STATUS, TASKS_TABLE};
    use taskdeck_storage::{FailureMode, InMemoryStore, StoreOp};
    use taskdeck_test_utils::fixtures::{create_request, task_for};

    fn service() -> (Arc<InMemoryStore>, TaskService<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::with_default_tables());
        let service = TaskService::new(
            Arc::clone(&store),
            Arc::new(TaskCache::new()),
            TASKS_TABLE,
            CacheConfig::default(),
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_create_writes_store_then_cache() {
        let (store, service) = service();
        let user = UserId::now_v7();

        let task = service.create(user, create_request("Buy milk")).await.unwrap();

        assert_eq!(task.status, INITIAL_STATUS);
        assert_eq!(task.user_id, user);
        assert_eq!(store.records(TASKS_TABLE).await.unwrap().len(), 1);
        assert_eq!(service.cache().get_all(user).await, vec![task]);
    }

    #[tokio::test]
    async fn test_create_empty_title_touches_nothing() {
        let (store, service) = service();
        let user = UserId::now_v7();

        let result = service.create(user, create_request("")).await;

        assert!(matches!(result, Err(TaskServiceError::Validation(_))));
        assert_eq!(store.calls(StoreOp::Put), 0);
        assert!(service.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_create_store_failure_is_reported_and_not_cached() {
        let (store, service) = service();
        store.fail(StoreOp::Put, FailureMode::Unavailable).await;

        let result = service.create(UserId::now_v7(), create_request("X")).await;

        assert!(matches!(
            result,
            Err(TaskServiceError::Store {
                operation: TaskOperation::Create,
                ..
            })
        ));
        assert!(service.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_list_fills_once_then_hits_cache() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let task = task_for(user, "a");
        store
            .put(TASKS_TABLE, task_to_record(&task).unwrap())
            .await
            .unwrap();

        let first = service.list(user, CancellationToken::new()).await.unwrap();
        let second = service.list(user, CancellationToken::new()).await.unwrap();

        assert_eq!(first, vec![task.clone()]);
        assert_eq!(second, vec![task]);
        assert_eq!(store.calls(StoreOp::Scan), 1);
    }

    #[tokio::test]
    async fn test_list_scan_failure_is_not_empty_list() {
        let (store, service) = service();
        store.fail(StoreOp::Scan, FailureMode::Unavailable).await;

        let result = service.list(UserId::now_v7(), CancellationToken::new()).await;
        assert!(matches!(result, Err(TaskServiceError::Fill(FillError::Scan(_)))));
    }

    #[tokio::test]
    async fn test_list_cancelled_fill() {
        let (store, service) = service();
        store.set_scan_delay(Some(Duration::from_secs(30))).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.list(UserId::now_v7(), cancel),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(TaskServiceError::Fill(FillError::Cancelled))));
    }

    #[tokio::test]
    async fn test_edit_updates_only_mutable_fields_in_store() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let mut task = service.create(user, create_request("a")).await.unwrap();
        task.status = "Done".to_string();
        task.description = "now with details".to_string();

        service.edit(user, task.clone()).await.unwrap();

        let records = store.records(TASKS_TABLE).await.unwrap();
        assert_eq!(records[0]["status"], json!("Done"));
        assert_eq!(records[0]["description"], json!("now with details"));
        assert_eq!(service.cache().get(task.task_id).await, Some(task));
    }

    #[tokio::test]
    async fn test_edit_overwrites_cache_even_when_store_fails() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let mut task = service.create(user, create_request("a")).await.unwrap();
        store.fail(StoreOp::Update, FailureMode::Unavailable).await;
        task.status = "Done".to_string();

        let edited = service.edit(user, task.clone()).await.unwrap();

        assert_eq!(edited, task);
        assert_eq!(service.cache().get_all(user).await, vec![task]);
        let records = store.records(TASKS_TABLE).await.unwrap();
        assert_eq!(records[0]["status"], json!(INITIAL_STATUS));
    }

    #[tokio::test]
    async fn test_edit_empty_title_touches_nothing() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let task = service.create(user, create_request("Buy milk")).await.unwrap();

        let mut cleared = task.clone();
        cleared.title = String::new();
        let result = service.edit(user, cleared).await;

        assert!(matches!(result, Err(TaskServiceError::Validation(_))));
        assert_eq!(store.calls(StoreOp::Update), 0);
        assert_eq!(service.cache().get(task.task_id).await, Some(task));
        let records = store.records(TASKS_TABLE).await.unwrap();
        assert_eq!(records[0]["title"], json!("Buy milk"));
    }

    #[tokio::test]
    async fn test_edit_rejects_foreign_owner() {
        let (store, service) = service();
        let alice = UserId::now_v7();
        let mallory = UserId::now_v7();
        let task = service.create(alice, create_request("a")).await.unwrap();

        let result = service.edit(mallory, task.clone()).await;
        assert!(matches!(result, Err(TaskServiceError::Forbidden { .. })));

        let mut hijack = task.clone();
        hijack.user_id = mallory;
        let result = service.edit(mallory, hijack).await;
        assert!(matches!(result, Err(TaskServiceError::Forbidden { .. })));

        assert_eq!(store.calls(StoreOp::Update), 0);
        assert_eq!(service.cache().get(task.task_id).await, Some(task));
    }

    #[tokio::test]
    async fn test_delete_removes_from_store_and_cache() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let task = service.create(user, create_request("a")).await.unwrap();

        service.delete(user, task.task_id).await.unwrap();

        assert!(store.records(TASKS_TABLE).await.unwrap().is_empty());
        assert!(service.cache().get_all(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_store_failure_keeps_cache_entry() {
        let (store, service) = service();
        let user = UserId::now_v7();
        let task = service.create(user, create_request("a")).await.unwrap();
        store.fail(StoreOp::Delete, FailureMode::Unavailable).await;

        let result = service.delete(user, task.task_id).await;

        assert!(matches!(
            result,
            Err(TaskServiceError::Store {
                operation: TaskOperation::Delete,
                ..
            })
        ));
        assert_eq!(service.cache().get(task.task_id).await, Some(task));
    }

    #[tokio::test]
    async fn test_delete_foreign_task_is_forbidden() {
        let (store, service) = service();
        let task = service
            .create(UserId::now_v7(), create_request("a"))
            .await
            .unwrap();

        let result = service.delete(UserId::now_v7(), task.task_id).await;

        assert!(matches!(result, Err(TaskServiceError::Forbidden { .. })));
        assert_eq!(store.calls(StoreOp::Delete), 0);
        assert!(service.cache().get(task.task_id).await.is_some());
    }

    #[tokio::test]
    async fn test_works_behind_dyn_store() {
        let store: Arc<dyn StoreClient> = Arc::new(InMemoryStore::with_default_tables());
        let service: TaskService<dyn StoreClient> = TaskService::new(
            store,
            Arc::new(TaskCache::new()),
            TASKS_TABLE,
            CacheConfig::default(),
        );
        let user = UserId::now_v7();
        let task = service.create(user, create_request("a")).await.unwrap();
        assert_eq!(
            service.list(user, CancellationToken::new()).await.unwrap(),
            vec![task]
        );
    }
}
