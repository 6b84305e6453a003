//! taskdeck Storage - Store Client and Task Cache
//!
//! The durable store is reached through the [`StoreClient`] trait, with an
//! in-memory implementation for tests and local runs and a DynamoDB one for
//! deployments. Reads go through the [`TaskCache`], which the
//! [`FillEngine`] populates from the store on a miss.

pub mod cache;
pub mod codec;
pub mod store;

pub use cache::{CacheConfig, CacheStats, FillEngine, FillError, FillHandle, TaskCache};
pub use codec::{
    task_from_record, task_key, task_mutable_fields, task_to_record, user_from_record, user_key,
    user_to_record,
};
pub use store::{
    DynamoConfig, DynamoStore, FailureMode, Filter, InMemoryStore, Record, StaticCredentials,
    StoreClient, StoreOp, StoreResult, TableSchema,
};
