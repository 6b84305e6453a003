//! REST API Routes
//!
//! Public routes: `/`, `/health`, `/health/ready`, `/signup`, `/login` and
//! `/openapi.json`. Everything under `/tasks` and `/task` requires an API key.

pub mod health;
pub mod tasks;
pub mod users;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::middleware::auth_middleware;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::request_logging_middleware;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Routes that need an authenticated caller.
fn task_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/tasks", get(tasks::list_tasks))
        .route("/task", post(tasks::create_task).put(tasks::edit_task))
        .route("/task/:task_id", delete(tasks::delete_task))
        .route_layer(from_fn_with_state(state.identity.clone(), auth_middleware))
}

/// Build the complete application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.api_config);

    Router::new()
        .route("/", get(health::up))
        .route("/health", get(health::up))
        .route("/health/ready", get(health::readiness))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/openapi.json", get(openapi_json))
        .merge(task_routes(&state))
        .layer(from_fn(request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

/// CORS for browser clients; an empty origin list accepts any origin.
pub fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.allows_any_origin() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricted origins");
        let config = config.clone();
        cors.allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request| {
                origin
                    .to_str()
                    .map(|origin| config.is_origin_allowed(origin))
                    .unwrap_or(false)
            },
        ))
    }
}
