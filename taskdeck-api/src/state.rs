//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use taskdeck_storage::{CacheConfig, DynamoConfig, DynamoStore, InMemoryStore, StoreClient, TaskCache};

use crate::auth::{IdentityResolver, StoreIdentityResolver};
use crate::config::{ApiConfig, StoreBackend, StoreConfig};
use crate::error::ApiResult;
use crate::services::{TaskService, UserService};

pub type SharedTaskService = Arc<TaskService<dyn StoreClient>>;
pub type SharedUserService = Arc<UserService<dyn StoreClient>>;
pub type SharedIdentityResolver = Arc<dyn IdentityResolver>;

/// Application-wide state shared across all routes.
///
/// Built once at startup; the store client and the task cache live exactly
/// as long as the server.
#[derive(Clone)]
pub struct AppState {
    pub tasks: SharedTaskService,
    pub users: SharedUserService,
    pub identity: SharedIdentityResolver,
    pub api_config: Arc<ApiConfig>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire services over `store` with a fresh, empty task cache.
    pub fn new(
        store: Arc<dyn StoreClient>,
        store_config: &StoreConfig,
        cache_config: CacheConfig,
        api_config: ApiConfig,
    ) -> Self {
        let cache = Arc::new(TaskCache::new());
        let tasks = TaskService::new(
            Arc::clone(&store),
            cache,
            &store_config.tasks_table,
            cache_config,
        );
        let users = UserService::new(Arc::clone(&store), &store_config.users_table);
        let identity = StoreIdentityResolver::new(store, &store_config.users_table);

        Self {
            tasks: Arc::new(tasks),
            users: Arc::new(users),
            identity: Arc::new(identity),
            api_config: Arc::new(api_config),
            start_time: Instant::now(),
        }
    }
}

/// Construct the store client selected by `config`.
pub async fn connect_store(config: &StoreConfig) -> ApiResult<Arc<dyn StoreClient>> {
    match config.backend {
        StoreBackend::Dynamo => {
            let dynamo = DynamoConfig::from_env()?;
            tracing::info!(
                endpoint = dynamo.endpoint.as_deref().unwrap_or("default"),
                region = dynamo.region.as_deref().unwrap_or("default"),
                static_credentials = dynamo.credentials.is_some(),
                "Using DynamoDB store"
            );
            Ok(Arc::new(DynamoStore::connect(&dynamo).await))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data does not survive a restart");
            Ok(Arc::new(InMemoryStore::with_tables(
                &config.tasks_table,
                &config.users_table,
            )))
        }
    }
}

crate::impl_from_ref!(SharedTaskService, tasks);
crate::impl_from_ref!(SharedUserService, users);
crate::impl_from_ref!(SharedIdentityResolver, identity);
crate::impl_from_ref!(Arc<ApiConfig>, api_config);
crate::impl_from_ref!(Instant, start_time);
