//! taskdeck Test Utilities
//!
//! Shared test infrastructure for the taskdeck workspace:
//! - Proptest generators for tasks and ids
//! - Fixtures for common scenarios
//! - Environment variable guards for config tests
//! - Assertions over the error taxonomy

pub use taskdeck_core::{
    CreateTask, StoreError, Task, TaskId, TaskdeckError, TaskdeckResult, User, UserId,
    INITIAL_STATUS,
};

use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating taskdeck entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_task_id() -> impl Strategy<Value = TaskId> {
        arb_uuid().prop_map(TaskId::from_uuid)
    }

    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        arb_uuid().prop_map(UserId::from_uuid)
    }

    /// Generate a non-empty task title.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 .,!?-]{0,39}"
    }

    /// Generate a task status, biased towards the usual workflow values.
    pub fn arb_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(INITIAL_STATUS.to_string()),
            Just("In Progress".to_string()),
            Just("Done".to_string()),
            "[A-Za-z ]{0,16}",
        ]
    }

    pub fn arb_create_task() -> impl Strategy<Value = CreateTask> {
        (arb_title(), ".{0,80}").prop_map(|(title, description)| CreateTask { title, description })
    }

    /// Generate a task owned by an arbitrary user.
    pub fn arb_task() -> impl Strategy<Value = Task> {
        arb_user_id().prop_flat_map(arb_task_for)
    }

    /// Generate a task owned by `user_id`.
    pub fn arb_task_for(user_id: UserId) -> impl Strategy<Value = Task> {
        (arb_task_id(), arb_title(), ".{0,80}", arb_status()).prop_map(
            move |(task_id, title, description, status)| Task {
                task_id,
                user_id,
                title,
                description,
                status,
            },
        )
    }

    /// Generate tasks spread over a small pool of owners, so owner
    /// filtering sees several tasks per user.
    pub fn arb_tasks(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec(arb_user_id(), 1..4).prop_flat_map(move |owners| {
            let per_task = (0..owners.len()).prop_flat_map(move |i| arb_task_for(owners[i]));
            prop::collection::vec(per_task, size.clone())
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;

    /// A fresh task in the initial status owned by `user_id`.
    pub fn task_for(user_id: UserId, title: &str) -> Task {
        CreateTask {
            title: title.to_string(),
            description: format!("{} description", title),
        }
        .into_task(user_id)
    }

    /// A create request with the given title.
    pub fn create_request(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: String::new(),
        }
    }

    /// A user whose password hash matches `password`.
    pub fn user(username: &str, password: &str, api_key: &str) -> User {
        User {
            user_id: UserId::now_v7(),
            username: username.to_string(),
            password_hash: taskdeck_core::hash_password(password),
            api_key: api_key.to_string(),
        }
    }

    /// Body for `PUT /task`.
    pub fn task_json(task: &Task) -> serde_json::Value {
        serde_json::json!({
            "taskID": task.task_id,
            "userID": task.user_id,
            "title": task.title,
            "description": task.description,
            "status": task.status,
        })
    }
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

pub mod env {
    //! Process environment helpers for config tests.

    use std::sync::{Mutex, MutexGuard};

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch the process environment.
    pub fn env_lock() -> MutexGuard<'static, ()> {
        ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets (or removes) an environment variable, restoring it on drop.
    pub struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        pub fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over taskdeck results and task sets.

    use super::*;

    /// Assert that a TaskdeckResult is a Store error.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &TaskdeckResult<T>) {
        match result {
            Err(TaskdeckError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }

    /// Assert that `tasks` contains `expected` exactly once.
    #[track_caller]
    pub fn assert_contains_once(tasks: &[Task], expected: &Task) {
        let matching: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.task_id == expected.task_id)
            .collect();
        assert_eq!(
            matching.len(),
            1,
            "Expected task {} exactly once, found {}",
            expected.task_id,
            matching.len()
        );
        assert_eq!(matching[0], expected, "Cached task differs from expected");
    }

    /// Assert that no task in `tasks` has `task_id`.
    #[track_caller]
    pub fn assert_absent(tasks: &[Task], task_id: TaskId) {
        assert!(
            tasks.iter().all(|t| t.task_id != task_id),
            "Expected task {} to be absent",
            task_id
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
