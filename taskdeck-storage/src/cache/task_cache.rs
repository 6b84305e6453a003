//! In-process task cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use taskdeck_core::{Task, TaskId, UserId};
use tokio::sync::RwLock;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// `get_all` calls that found at least one entry.
    pub hits: u64,
    /// `get_all` calls that found nothing.
    pub misses: u64,
    /// Fills that completed without failure.
    pub fills: u64,
    /// Fills that ended in a scan, decode or cancellation failure.
    pub fill_failures: u64,
    /// Number of entries currently cached.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Mapping of task id to task, guarded by a single reader/writer lock.
///
/// Every value handed out is a clone, so callers never alias cache state.
/// Entries have no TTL and are never evicted: the map grows for the lifetime
/// of the process and is only shrunk by [`TaskCache::delete`].
#[derive(Debug, Default)]
pub struct TaskCache {
    entries: RwLock<HashMap<TaskId, Task>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fills: AtomicU64,
    fill_failures: AtomicU64,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cached tasks owned by `user_id`, in no particular order.
    ///
    /// Linear in the total number of entries; there is no index by owner.
    pub async fn get_all(&self, user_id: UserId) -> Vec<Task> {
        let tasks: Vec<Task> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|task| task.user_id == user_id)
                .cloned()
                .collect()
        };
        if tasks.is_empty() {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        tasks
    }

    /// Insert or overwrite the entry keyed by `task.task_id`.
    pub async fn put(&self, task: Task) {
        self.entries.write().await.insert(task.task_id, task);
    }

    /// Remove the entry for `task_id`. Returns whether an entry was present.
    pub async fn delete(&self, task_id: TaskId) -> bool {
        self.entries.write().await.remove(&task_id).is_some()
    }

    pub async fn get(&self, task_id: TaskId) -> Option<Task> {
        self.entries.read().await.get(&task_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            fill_failures: self.fill_failures.load(Ordering::Relaxed),
            entry_count: self.len().await as u64,
        }
    }

    pub(crate) fn record_fill(&self, succeeded: bool) {
        if succeeded {
            self.fills.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fill_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}
