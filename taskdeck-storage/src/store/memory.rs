//! In-memory Store Client.
//!
//! Used by tests and by `TASKDECK_STORE=memory` for local runs. Supports
//! per-operation failure injection, a scan delay and call counters so the
//! cache and mutation paths can be exercised against store outages.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use taskdeck_core::{
    task_fields, user_fields, StoreError, API_KEY_INDEX, TASKS_TABLE, USERS_TABLE,
};
use tokio::sync::RwLock;

use super::{project, Filter, Record, StoreClient, StoreResult, TableSchema};

/// Store operation kinds, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Put,
    Update,
    Delete,
    Get,
    Scan,
    QueryIndex,
}

impl StoreOp {
    const ALL: [StoreOp; 6] = [
        StoreOp::Put,
        StoreOp::Update,
        StoreOp::Delete,
        StoreOp::Get,
        StoreOp::Scan,
        StoreOp::QueryIndex,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How an injected failure manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    /// The store cannot be reached.
    Unavailable,
    /// The store answers with a service error.
    Rejected { code: String, message: String },
}

impl FailureMode {
    fn to_error(&self, op: StoreOp, table: &str) -> StoreError {
        match self {
            FailureMode::Unavailable => {
                StoreError::unavailable(format!("injected {:?} failure on {}", op, table))
            }
            FailureMode::Rejected { code, message } => StoreError::Rejected {
                code: code.clone(),
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    /// Secondary index name to indexed attribute.
    indexes: HashMap<String, String>,
    /// Items keyed by the canonical JSON of their key attributes.
    items: BTreeMap<String, Record>,
}

impl Table {
    fn storage_key(&self, table: &str, record: &Record) -> StoreResult<String> {
        let key = self.schema.key_of(table, record)?;
        serde_json::to_string(&key).map_err(|e| StoreError::InvalidKey {
            table: table.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Store Client backed by process memory.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    failures: RwLock<HashMap<StoreOp, FailureMode>>,
    scan_delay: RwLock<Option<Duration>>,
    calls: [AtomicU64; 6],
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            scan_delay: RwLock::new(None),
            calls: Default::default(),
        }
    }
}

impl InMemoryStore {
    /// Create a store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the `Tasks` and `Users` tables and the API key index.
    pub fn with_default_tables() -> Self {
        Self::with_tables(TASKS_TABLE, USERS_TABLE)
    }

    /// Create a store with the task and user tables under the given names.
    pub fn with_tables(tasks_table: &str, users_table: &str) -> Self {
        let mut tables = HashMap::new();
        tables.insert(
            tasks_table.to_string(),
            Table {
                schema: TableSchema::new(task_fields::TASK_ID).with_sort_key(task_fields::USER_ID),
                indexes: HashMap::new(),
                items: BTreeMap::new(),
            },
        );
        tables.insert(
            users_table.to_string(),
            Table {
                schema: TableSchema::new(user_fields::USERNAME),
                indexes: HashMap::from([(
                    API_KEY_INDEX.to_string(),
                    user_fields::API_KEY.to_string(),
                )]),
                items: BTreeMap::new(),
            },
        );
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Register a table.
    pub async fn create_table(&self, name: &str, schema: TableSchema) {
        self.tables.write().await.insert(
            name.to_string(),
            Table {
                schema,
                indexes: HashMap::new(),
                items: BTreeMap::new(),
            },
        );
    }

    /// Register a secondary index on an existing table.
    pub async fn create_index(&self, table: &str, index: &str, field: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let entry = tables.get_mut(table).ok_or_else(|| StoreError::UnknownTable {
            table: table.to_string(),
        })?;
        entry.indexes.insert(index.to_string(), field.to_string());
        Ok(())
    }

    /// Make every subsequent call of `op` fail until cleared.
    pub async fn fail(&self, op: StoreOp, mode: FailureMode) {
        self.failures.write().await.insert(op, mode);
    }

    /// Make every operation kind fail.
    pub async fn fail_all(&self, mode: FailureMode) {
        let mut failures = self.failures.write().await;
        for op in StoreOp::ALL {
            failures.insert(op, mode.clone());
        }
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Delay every scan, to hold a fill open.
    pub async fn set_scan_delay(&self, delay: Option<Duration>) {
        *self.scan_delay.write().await = delay;
    }

    /// Number of calls made for `op`, including failed ones.
    pub fn calls(&self, op: StoreOp) -> u64 {
        self.calls[op.index()].load(Ordering::Relaxed)
    }

    /// Insert a record as-is, bypassing failure injection and call counting.
    ///
    /// Only the key attributes are checked, so malformed records can be seeded.
    pub async fn insert_raw(&self, table: &str, record: Record) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let entry = table_mut(&mut tables, table)?;
        let key = entry.storage_key(table, &record)?;
        entry.items.insert(key, record);
        Ok(())
    }

    /// Every record of a table, in key order.
    pub async fn records(&self, table: &str) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let entry = table_ref(&tables, table)?;
        Ok(entry.items.values().cloned().collect())
    }

    async fn begin(&self, op: StoreOp, table: &str) -> StoreResult<()> {
        self.calls[op.index()].fetch_add(1, Ordering::Relaxed);
        match self.failures.read().await.get(&op) {
            Some(mode) => Err(mode.to_error(op, table)),
            None => Ok(()),
        }
    }
}

fn table_ref<'a>(tables: &'a HashMap<String, Table>, name: &str) -> StoreResult<&'a Table> {
    tables.get(name).ok_or_else(|| StoreError::UnknownTable {
        table: name.to_string(),
    })
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    name: &str,
) -> StoreResult<&'a mut Table> {
    tables.get_mut(name).ok_or_else(|| StoreError::UnknownTable {
        table: name.to_string(),
    })
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn put(&self, table: &str, record: Record) -> StoreResult<()> {
        self.begin(StoreOp::Put, table).await?;
        let mut tables = self.tables.write().await;
        let entry = table_mut(&mut tables, table)?;
        let key = entry.storage_key(table, &record)?;
        entry.items.insert(key, record);
        Ok(())
    }

    async fn update(&self, table: &str, key: Record, fields: Record) -> StoreResult<()> {
        self.begin(StoreOp::Update, table).await?;
        let mut tables = self.tables.write().await;
        let entry = table_mut(&mut tables, table)?;
        let storage_key = entry.storage_key(table, &key)?;
        // Updating an absent item creates it from the key, as DynamoDB does.
        let item = entry.items.entry(storage_key).or_insert(key);
        for (field, value) in fields {
            item.insert(field, value);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, key: Record) -> StoreResult<()> {
        self.begin(StoreOp::Delete, table).await?;
        let mut tables = self.tables.write().await;
        let entry = table_mut(&mut tables, table)?;
        let storage_key = entry.storage_key(table, &key)?;
        entry.items.remove(&storage_key);
        Ok(())
    }

    async fn get(&self, table: &str, key: Record) -> StoreResult<Option<Record>> {
        self.begin(StoreOp::Get, table).await?;
        let tables = self.tables.read().await;
        let entry = table_ref(&tables, table)?;
        let storage_key = entry.storage_key(table, &key)?;
        Ok(entry.items.get(&storage_key).cloned())
    }

    async fn scan(
        &self,
        table: &str,
        filter: &Filter,
        projection: &[&str],
    ) -> StoreResult<Vec<Record>> {
        self.begin(StoreOp::Scan, table).await?;
        let delay = *self.scan_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let tables = self.tables.read().await;
        let entry = table_ref(&tables, table)?;
        Ok(entry
            .items
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| project(record, projection))
            .collect())
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Record>> {
        self.begin(StoreOp::QueryIndex, table).await?;
        let tables = self.tables.read().await;
        let entry = table_ref(&tables, table)?;
        match entry.indexes.get(index) {
            Some(indexed) if indexed == field => {}
            _ => {
                return Err(StoreError::Rejected {
                    code: "ValidationException".to_string(),
                    message: format!("no index {} on {}.{}", index, table, field),
                })
            }
        }
        let filter = Filter::eq(field, value.clone());
        Ok(entry
            .items
            .values()
            .filter(|record| filter.matches(record))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn task_record(task_id: &str, user_id: &str, title: &str) -> Record {
        record(json!({
            "taskID": task_id,
            "userID": user_id,
            "title": title,
            "description": "",
            "status": "To Do",
        }))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryStore::with_default_tables();
        store
            .put(TASKS_TABLE, task_record("t1", "u1", "a"))
            .await
            .unwrap();

        let found = store
            .get(TASKS_TABLE, record(json!({"taskID": "t1", "userID": "u1"})))
            .await
            .unwrap();
        assert_eq!(found, Some(task_record("t1", "u1", "a")));
        assert_eq!(store.calls(StoreOp::Put), 1);
        assert_eq!(store.calls(StoreOp::Get), 1);
    }

    #[tokio::test]
    async fn test_scan_filters_and_projects() {
        let store = InMemoryStore::with_default_tables();
        store.put(TASKS_TABLE, task_record("t1", "u1", "a")).await.unwrap();
        store.put(TASKS_TABLE, task_record("t2", "u2", "b")).await.unwrap();
        store.put(TASKS_TABLE, task_record("t3", "u1", "c")).await.unwrap();

        let found = store
            .scan(TASKS_TABLE, &Filter::eq("userID", "u1"), &["taskID", "title"])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.len() == 2 && r.contains_key("title")));
    }

    #[tokio::test]
    async fn test_update_touches_named_fields_only() {
        let store = InMemoryStore::with_default_tables();
        store.put(TASKS_TABLE, task_record("t1", "u1", "a")).await.unwrap();

        store
            .update(
                TASKS_TABLE,
                record(json!({"taskID": "t1", "userID": "u1"})),
                record(json!({"status": "Done"})),
            )
            .await
            .unwrap();

        let records = store.records(TASKS_TABLE).await.unwrap();
        assert_eq!(records[0]["status"], json!("Done"));
        assert_eq!(records[0]["title"], json!("a"));
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        let store = InMemoryStore::with_default_tables();
        store
            .delete(TASKS_TABLE, record(json!({"taskID": "t1", "userID": "u1"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = InMemoryStore::new();
        let err = store
            .scan("Nope", &Filter::eq("a", 1), &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::UnknownTable {
                table: "Nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_injected_failure_counts_call_and_leaves_data() {
        let store = InMemoryStore::with_default_tables();
        store.fail(StoreOp::Put, FailureMode::Unavailable).await;

        let err = store
            .put(TASKS_TABLE, task_record("t1", "u1", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert_eq!(store.calls(StoreOp::Put), 1);
        assert!(store.records(TASKS_TABLE).await.unwrap().is_empty());

        store.clear_failures().await;
        store.put(TASKS_TABLE, task_record("t1", "u1", "a")).await.unwrap();
        assert_eq!(store.records(TASKS_TABLE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_index_by_api_key() {
        let store = InMemoryStore::with_default_tables();
        store
            .put(
                USERS_TABLE,
                record(json!({"username": "alice1", "userID": "u1", "apiKey": "k1"})),
            )
            .await
            .unwrap();

        let found = store
            .query_index(
                USERS_TABLE,
                API_KEY_INDEX,
                "apiKey",
                &json!("k1"),
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let err = store
            .query_index(USERS_TABLE, "missing-index", "apiKey", &json!("k1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
    }
}
