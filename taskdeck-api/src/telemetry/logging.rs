//! Subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::error::{ApiError, ApiResult};

/// Filter from `RUST_LOG`, or the built-in default when it is unset or
/// unparseable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> ApiResult<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    let result = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::debug!(format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_test_utils::env::{env_lock, EnvVarGuard};

    #[test]
    fn test_env_filter_falls_back_to_default() {
        let _lock = env_lock();
        let _rust_log = EnvVarGuard::set("RUST_LOG", None);
        assert_eq!(env_filter().to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
    }

    #[test]
    fn test_env_filter_honours_rust_log() {
        let _lock = env_lock();
        let _rust_log = EnvVarGuard::set("RUST_LOG", Some("warn"));
        assert_eq!(env_filter().to_string(), "warn");
    }

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let config = LogConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
