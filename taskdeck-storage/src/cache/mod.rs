//! Read-through task cache.
//!
//! [`TaskCache`] holds the in-memory copy of tasks; [`FillEngine`] populates
//! it from the store when a user's lookup comes back empty.

pub mod fill;
pub mod task_cache;

pub use fill::{FillEngine, FillError, FillHandle};
pub use task_cache::{CacheStats, TaskCache};

use taskdeck_core::ConfigError;

const DEFAULT_FILL_CHANNEL_CAPACITY: usize = 64;

/// Configuration for the cache fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Capacity of the bounded result channel between a fill and its reader.
    pub fill_channel_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fill_channel_capacity: DEFAULT_FILL_CHANNEL_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `TASKDECK_FILL_CHANNEL_CAPACITY`, falling back to the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fill_channel_capacity = match std::env::var("TASKDECK_FILL_CHANNEL_CAPACITY") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "TASKDECK_FILL_CHANNEL_CAPACITY".to_string(),
                        value: raw,
                        reason: "must be a positive integer".to_string(),
                    })
                }
            },
            Err(_) => DEFAULT_FILL_CHANNEL_CAPACITY,
        };
        Ok(Self {
            fill_channel_capacity,
        })
    }

    /// Set the fill channel capacity.
    pub fn with_fill_channel_capacity(mut self, capacity: usize) -> Self {
        self.fill_channel_capacity = capacity;
        self
    }
}
