use crate::error::DatabaseErrorConverter;
use thiserror::Error;

/// Application-wide error type that represents all possible errors in the system.
///
/// Structured variants carry enough context for both logging and the
/// user-visible messages the dispatcher builds from them. Nothing here is
/// fatal to the process; the only unrecoverable condition is store
/// initialization at startup.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} already exists")]
    Duplicate { entity: String, field: String },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// An external collaborator (ERP, access-log feed) failed or timed out
    #[error("Upstream service unavailable: {service}")]
    Upstream {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    /// The chat transport rejected or failed an outbound operation
    #[error("Transport error: {operation}")]
    Transport {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// The recipient has blocked the bot; the chat is unreachable until
    /// they return
    #[error("Recipient {chat_id} has blocked the bot")]
    RecipientBlocked { chat_id: i64 },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Wraps a failure talking to a named external service.
    pub fn upstream(service: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Upstream {
            service: service.into(),
            source: source.into(),
        }
    }

    /// Wraps a failed outbound transport operation.
    pub fn transport(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(error: diesel::r2d2::PoolError) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        AppError::Internal {
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
