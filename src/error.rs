//! Error types for the exam scheduling engine.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias for data access gateway operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a data access gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("read failed during {operation}: {message}")]
    Read {
        operation: &'static str,
        message: String,
    },

    #[error("write failed during {operation}: {message}")]
    Write {
        operation: &'static str,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

/// Errors raised while loading or checking the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid reference data: {}", summarize(.0))]
    InvalidReferenceData(Vec<ValidationError>),

    #[error("illegal run state transition from {from} to {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Write {
            operation: "insert_blocks",
            message: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "write failed during insert_blocks: connection reset"
        );
    }

    #[test]
    fn test_engine_error_from_store() {
        let err: EngineError = StoreError::NotFound("room 7".into()).into();
        assert!(matches!(err, EngineError::Store(_)));
        assert_eq!(err.to_string(), "store failure: not found: room 7");
    }

    #[test]
    fn test_invalid_reference_data_summary() {
        let errors = vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate room ID: 1"),
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate room ID: 2"),
        ];
        let err = EngineError::InvalidReferenceData(errors);
        assert_eq!(
            err.to_string(),
            "invalid reference data: Duplicate room ID: 1 (and 1 more)"
        );
    }
}
