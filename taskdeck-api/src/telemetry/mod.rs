//! taskdeck Telemetry
//!
//! Structured logging for the API layer: subscriber setup and per-request
//! logging. There is no metrics or trace export.

pub mod logging;
pub mod middleware;

pub use logging::init_logging;
pub use middleware::request_logging_middleware;
