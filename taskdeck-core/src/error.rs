//! Error types for taskdeck operations

use thiserror::Error;

/// Durable store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Write to {table} failed: {reason}")]
    WriteFailed { table: String, reason: String },

    #[error("Delete from {table} failed: {reason}")]
    DeleteFailed { table: String, reason: String },

    #[error("Read from {table} failed: {reason}")]
    ReadFailed { table: String, reason: String },

    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Invalid key for {table}: {reason}")]
    InvalidKey { table: String, reason: String },

    #[error("Store rejected request ({code}): {message}")]
    Rejected { code: String, message: String },
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Errors converting between store records and typed entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Missing attribute {field} in {entity} record")]
    MissingField { entity: String, field: String },

    #[error("Invalid attribute {field} in {entity} record: {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Field {field} must be at least {min} characters")]
    TooShort { field: String, min: usize },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all taskdeck errors.
#[derive(Debug, Clone, Error)]
pub enum TaskdeckError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for taskdeck operations.
pub type TaskdeckResult<T> = Result<T, TaskdeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_write_failed() {
        let err = StoreError::WriteFailed {
            table: "Tasks".to_string(),
            reason: "throttled".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Tasks"));
        assert!(msg.contains("throttled"));
    }

    #[test]
    fn test_codec_error_display_missing_field() {
        let err = CodecError::MissingField {
            entity: "Task".to_string(),
            field: "title".to_string(),
        };
        assert_eq!(format!("{}", err), "Missing attribute title in Task record");
    }

    #[test]
    fn test_validation_error_display_too_short() {
        let err = ValidationError::TooShort {
            field: "username".to_string(),
            min: 6,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("username"));
        assert!(msg.contains('6'));
    }

    #[test]
    fn test_taskdeck_error_from_variants() {
        let store = TaskdeckError::from(StoreError::unavailable("down"));
        assert!(matches!(store, TaskdeckError::Store(_)));

        let validation = TaskdeckError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, TaskdeckError::Validation(_)));

        let config = TaskdeckError::from(ConfigError::MissingRequired {
            field: "AWS_REGION".to_string(),
        });
        assert!(matches!(config, TaskdeckError::Config(_)));
    }
}
