//! Concurrent cache fill.
//!
//! On a cache miss for a user, one background task scans the store for that
//! user's tasks. Each decoded task is written into the cache and then sent on
//! a bounded result channel. A scan or decode failure travels on a separate
//! one-shot channel so that "no tasks" and "fill failed" stay distinct.

use std::sync::Arc;

use taskdeck_core::{task_fields, StoreError, Task, UserId, TASK_FIELDS};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{CacheConfig, TaskCache};
use crate::codec::task_from_record;
use crate::store::{Filter, StoreClient};

/// Why a fill did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FillError {
    #[error("Task scan failed: {0}")]
    Scan(#[from] StoreError),

    #[error("Stored task could not be decoded: {reason}")]
    Decode { reason: String },

    #[error("Task fill was cancelled")]
    Cancelled,

    #[error("Task fill ended unexpectedly")]
    Aborted,
}

/// Launches cache fills against a store.
pub struct FillEngine<S: StoreClient + ?Sized> {
    store: Arc<S>,
    cache: Arc<TaskCache>,
    table: Arc<str>,
    config: CacheConfig,
}

impl<S: StoreClient + ?Sized> Clone for FillEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            table: Arc::clone(&self.table),
            config: self.config.clone(),
        }
    }
}

impl<S: StoreClient + ?Sized> FillEngine<S> {
    pub fn new(store: Arc<S>, cache: Arc<TaskCache>, table: &str, config: CacheConfig) -> Self {
        Self {
            store,
            cache,
            table: Arc::from(table),
            config,
        }
    }

    /// Start a fill for `user_id` on a separate task.
    ///
    /// Cancelling `cancel` aborts the in-flight scan. Dropping the returned
    /// handle stops the fill at the next send.
    pub fn spawn(&self, user_id: UserId, cancel: CancellationToken) -> FillHandle {
        let (tx, results) = mpsc::channel(self.config.fill_channel_capacity.max(1));
        let (failure_tx, failure) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let table = Arc::clone(&self.table);

        let task = tokio::spawn(async move {
            match run_fill(store.as_ref(), &cache, &table, user_id, &cancel, tx).await {
                Ok(count) => {
                    cache.record_fill(true);
                    tracing::debug!(user_id = %user_id, count, "Task fill completed");
                }
                Err(error) => {
                    cache.record_fill(false);
                    tracing::warn!(user_id = %user_id, error = %error, "Task fill failed");
                    let _ = failure_tx.send(error);
                }
            }
        });

        FillHandle {
            results,
            failure,
            task,
        }
    }
}

async fn run_fill<S: StoreClient + ?Sized>(
    store: &S,
    cache: &TaskCache,
    table: &str,
    user_id: UserId,
    cancel: &CancellationToken,
    tx: mpsc::Sender<Task>,
) -> Result<usize, FillError> {
    let filter = Filter::eq(task_fields::USER_ID, user_id.to_string());

    let records = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FillError::Cancelled),
        scanned = store.scan(table, &filter, &TASK_FIELDS) => scanned?,
    };

    let mut sent = 0;
    for record in records {
        if cancel.is_cancelled() {
            return Err(FillError::Cancelled);
        }
        let task = task_from_record(record).map_err(|e| FillError::Decode {
            reason: e.to_string(),
        })?;

        cache.put(task.clone()).await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FillError::Cancelled),
            delivered = tx.send(task) => {
                if delivered.is_err() {
                    tracing::debug!(user_id = %user_id, "Fill receiver dropped, stopping");
                    return Ok(sent);
                }
            }
        }
        sent += 1;
    }
    Ok(sent)
}

/// Receiving side of a running fill.
#[derive(Debug)]
pub struct FillHandle {
    results: mpsc::Receiver<Task>,
    failure: oneshot::Receiver<FillError>,
    task: JoinHandle<()>,
}

impl FillHandle {
    /// Next task from the fill, or `None` once the fill has ended.
    pub async fn next(&mut self) -> Option<Task> {
        self.results.recv().await
    }

    /// Drain every result, then report whether the fill failed.
    pub async fn collect(mut self) -> Result<Vec<Task>, FillError> {
        let mut tasks = Vec::new();
        while let Some(task) = self.results.recv().await {
            tasks.push(task);
        }

        match self.failure.await {
            Ok(error) => Err(error),
            // Sender dropped without a message: the fill either finished
            // cleanly or its task died.
            Err(_) => match self.task.await {
                Ok(()) => Ok(tasks),
                Err(_) => Err(FillError::Aborted),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::task_to_record;
    use crate::store::{FailureMode, InMemoryStore, StoreOp};
    use serde_json::json;
    use std::time::Duration;
    use taskdeck_core::TASKS_TABLE;
    use taskdeck_test_utils::fixtures::task_for;

    async fn engine_with(tasks: &[Task]) -> (Arc<InMemoryStore>, Arc<TaskCache>, FillEngine<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::with_default_tables());
        for task in tasks {
            store
                .put(TASKS_TABLE, task_to_record(task).unwrap())
                .await
                .unwrap();
        }
        let cache = Arc::new(TaskCache::new());
        let engine = FillEngine::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            TASKS_TABLE,
            CacheConfig::default(),
        );
        (store, cache, engine)
    }

    #[tokio::test]
    async fn test_fill_returns_and_caches_user_tasks() {
        let alice = UserId::now_v7();
        let bob = UserId::now_v7();
        let tasks = vec![task_for(alice, "a"), task_for(alice, "b"), task_for(bob, "c")];
        let (store, cache, engine) = engine_with(&tasks).await;

        let mut filled = engine
            .spawn(alice, CancellationToken::new())
            .collect()
            .await
            .unwrap();
        filled.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(filled, vec![tasks[0].clone(), tasks[1].clone()]);
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(tasks[2].task_id).await.is_none());
        assert_eq!(store.calls(StoreOp::Scan), 1);
        assert_eq!(cache.stats().await.fills, 1);
    }

    #[tokio::test]
    async fn test_empty_fill_is_success() {
        let (_store, cache, engine) = engine_with(&[]).await;
        let filled = engine
            .spawn(UserId::now_v7(), CancellationToken::new())
            .collect()
            .await;
        assert_eq!(filled, Ok(Vec::new()));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_scan_failure_is_distinct_from_empty() {
        let (store, cache, engine) = engine_with(&[]).await;
        store.fail(StoreOp::Scan, FailureMode::Unavailable).await;

        let filled = engine
            .spawn(UserId::now_v7(), CancellationToken::new())
            .collect()
            .await;
        assert!(matches!(filled, Err(FillError::Scan(StoreError::Unavailable { .. }))));
        assert_eq!(cache.stats().await.fill_failures, 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_aborts_without_caching_it() {
        let user = UserId::now_v7();
        let (store, cache, engine) = engine_with(&[]).await;
        let corrupt_id = taskdeck_core::TaskId::now_v7();
        store
            .insert_raw(
                TASKS_TABLE,
                json!({
                    "taskID": corrupt_id.to_string(),
                    "userID": user.to_string(),
                    "title": 17,
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .await
            .unwrap();

        let filled = engine.spawn(user, CancellationToken::new()).collect().await;
        assert!(matches!(filled, Err(FillError::Decode { .. })));
        assert!(cache.get(corrupt_id).await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_aborts_inflight_scan() {
        let user = UserId::now_v7();
        let (store, cache, engine) = engine_with(&[task_for(user, "a")]).await;
        store.set_scan_delay(Some(Duration::from_secs(30))).await;

        let cancel = CancellationToken::new();
        let handle = engine.spawn(user, cancel.clone());
        cancel.cancel();

        let filled = tokio::time::timeout(Duration::from_secs(5), handle.collect())
            .await
            .unwrap();
        assert_eq!(filled, Err(FillError::Cancelled));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_slow_scan_does_not_block_cache() {
        let alice = UserId::now_v7();
        let bob = UserId::now_v7();
        let (store, cache, engine) = engine_with(&[task_for(alice, "a")]).await;
        store.set_scan_delay(Some(Duration::from_millis(500))).await;

        let handle = engine.spawn(alice, CancellationToken::new());
        tokio::task::yield_now().await;

        let bobs = task_for(bob, "b");
        let within = Duration::from_millis(100);
        tokio::time::timeout(within, cache.put(bobs.clone()))
            .await
            .expect("put blocked by in-flight fill");
        let listed = tokio::time::timeout(within, cache.get_all(bob))
            .await
            .expect("get_all blocked by in-flight fill");
        assert_eq!(listed, vec![bobs]);
        assert!(!handle.task.is_finished());

        let filled = handle.collect().await.unwrap();
        assert_eq!(filled.len(), 1);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_cached_before_emitted() {
        let user = UserId::now_v7();
        let task = task_for(user, "a");
        let (_store, cache, engine) = engine_with(&[task.clone()]).await;

        let mut handle = engine.spawn(user, CancellationToken::new());
        let first = handle.next().await.unwrap();
        assert_eq!(cache.get(first.task_id).await, Some(task));
    }

    #[tokio::test]
    async fn test_small_channel_still_delivers_everything() {
        let user = UserId::now_v7();
        let tasks: Vec<Task> = (0..10).map(|i| task_for(user, &format!("t{}", i))).collect();
        let (store, _cache, _engine) = engine_with(&tasks).await;
        let cache = Arc::new(TaskCache::new());
        let engine = FillEngine::new(
            store,
            Arc::clone(&cache),
            TASKS_TABLE,
            CacheConfig::default().with_fill_channel_capacity(1),
        );

        let filled = engine
            .spawn(user, CancellationToken::new())
            .collect()
            .await
            .unwrap();
        assert_eq!(filled.len(), 10);
        assert_eq!(cache.len().await, 10);
    }
}
