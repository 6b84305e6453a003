//! Table, index and attribute names of the durable store.
//!
//! Both the store key schema and the cache key derive from `taskID` alone;
//! `userID` is the partition that ownership queries filter on.

/// Default name of the table holding task records.
pub const TASKS_TABLE: &str = "Tasks";

/// Default name of the table holding user records.
pub const USERS_TABLE: &str = "Users";

/// Secondary index on `Users.apiKey`, used to resolve bearer tokens.
pub const API_KEY_INDEX: &str = "apiKey-index";

/// Attribute names of a task record.
pub mod task_fields {
    pub const TASK_ID: &str = "taskID";
    pub const USER_ID: &str = "userID";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const STATUS: &str = "status";
}

/// Every attribute of a task record, in declaration order.
pub const TASK_FIELDS: [&str; 5] = [
    task_fields::TASK_ID,
    task_fields::USER_ID,
    task_fields::TITLE,
    task_fields::DESCRIPTION,
    task_fields::STATUS,
];

/// Attribute names of a user record.
pub mod user_fields {
    pub const USER_ID: &str = "userID";
    pub const USERNAME: &str = "username";
    pub const PASSWORD_HASH: &str = "passwordHash";
    pub const API_KEY: &str = "apiKey";
}
