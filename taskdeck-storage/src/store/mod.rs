//! Store Client abstraction over the durable key-value store.
//!
//! Records are plain attribute maps. Table identity is a string name and the
//! key of a record is the subset of its attributes named by the table's
//! [`TableSchema`]. No transactions or conditional writes are offered.

pub mod dynamo;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use taskdeck_core::StoreError;

pub use dynamo::{DynamoConfig, DynamoStore, StaticCredentials};
pub use memory::{FailureMode, InMemoryStore, StoreOp};

/// One item of a table, attribute name to value.
pub type Record = Map<String, Value>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Equality filter applied server-side during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a record satisfies this filter.
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.field) == Some(&self.value)
    }
}

/// Key schema of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableSchema {
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Names of the key attributes, partition key first.
    pub fn key_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Extract the key attributes of `record`, failing if any is absent.
    pub fn key_of(&self, table: &str, record: &Record) -> StoreResult<Record> {
        let mut key = Record::new();
        for field in self.key_fields() {
            let value = record.get(field).ok_or_else(|| StoreError::InvalidKey {
                table: table.to_string(),
                reason: format!("missing key attribute {}", field),
            })?;
            key.insert(field.to_string(), value.clone());
        }
        Ok(key)
    }
}

/// Point and scan operations against the durable store.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Insert or replace a whole record.
    async fn put(&self, table: &str, record: Record) -> StoreResult<()>;

    /// Set only the attributes in `fields` on the record identified by `key`.
    async fn update(&self, table: &str, key: Record, fields: Record) -> StoreResult<()>;

    /// Delete the record identified by `key`. Deleting an absent key succeeds.
    async fn delete(&self, table: &str, key: Record) -> StoreResult<()>;

    /// Fetch one record by key.
    async fn get(&self, table: &str, key: Record) -> StoreResult<Option<Record>>;

    /// Return every record matching `filter`, restricted to `projection`.
    async fn scan(
        &self,
        table: &str,
        filter: &Filter,
        projection: &[&str],
    ) -> StoreResult<Vec<Record>>;

    /// Look up records through a secondary index on `field`.
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Record>>;
}

/// Keep only the projected attributes of a record.
pub(crate) fn project(record: &Record, projection: &[&str]) -> Record {
    if projection.is_empty() {
        return record.clone();
    }
    projection
        .iter()
        .filter_map(|field| {
            record
                .get(*field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches_exact_value() {
        let filter = Filter::eq("userID", "u1");
        assert!(filter.matches(&record(json!({"userID": "u1", "title": "a"}))));
        assert!(!filter.matches(&record(json!({"userID": "u2"}))));
        assert!(!filter.matches(&record(json!({"title": "a"}))));
    }

    #[test]
    fn test_key_of_composite_schema() {
        let schema = TableSchema::new("taskID").with_sort_key("userID");
        let key = schema
            .key_of(
                "Tasks",
                &record(json!({"taskID": "t", "userID": "u", "title": "x"})),
            )
            .unwrap();
        assert_eq!(key, record(json!({"taskID": "t", "userID": "u"})));
    }

    #[test]
    fn test_key_of_missing_attribute() {
        let schema = TableSchema::new("taskID").with_sort_key("userID");
        let err = schema
            .key_of("Tasks", &record(json!({"taskID": "t"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn test_project_keeps_named_fields_only() {
        let full = record(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(project(&full, &["a", "c"]), record(json!({"a": 1, "c": 3})));
        assert_eq!(project(&full, &[]), full);
    }
}
