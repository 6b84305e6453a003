//! Per-request logging.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info_span, Instrument};

static UUID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}").ok()
});

static NUMERIC_ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

/// Replace UUIDs and numeric path segments with `{id}` so log lines for the
/// same route group together.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.to_string();
    if let Some(pattern) = UUID_PATTERN.as_ref() {
        normalized = pattern.replace_all(&normalized, "{id}").into_owned();
    }
    if let Some(pattern) = NUMERIC_ID_PATTERN.as_ref() {
        normalized = pattern.replace_all(&normalized, "/{id}$1").into_owned();
    }
    normalized
}

/// Wraps every request in an `http_request` span and logs its outcome.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = normalize_path(request.uri().path());

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.route = %route,
    );
    let response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %route,
            status = status.as_u16(),
            duration_ms,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %route,
            status = status.as_u16(),
            duration_ms,
            "Request completed"
        );
    }

    response
}
