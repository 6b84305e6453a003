//! Health Check Endpoints
//!
//! No authentication required.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use taskdeck_storage::CacheStats;

use crate::constants::MSG_UP_AND_RUNNING;
use crate::state::SharedTaskService;

// ============================================================================
// TYPES
// ============================================================================

/// Readiness report.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub cache: CacheHealth,
}

/// Snapshot of the task cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CacheHealth {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub fills: u64,
    pub fill_failures: u64,
}

impl From<CacheStats> for CacheHealth {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entry_count,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            fills: stats.fills,
            fill_failures: stats.fill_failures,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET / and GET /health - Liveness
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
)]
pub async fn up() -> impl IntoResponse {
    (StatusCode::OK, Json(MSG_UP_AND_RUNNING))
}

/// GET /health/ready - Uptime and cache counters
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
    ),
)]
pub async fn readiness(
    State(tasks): State<SharedTaskService>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        cache: tasks.cache().stats().await.into(),
    };
    (StatusCode::OK, Json(response))
}
