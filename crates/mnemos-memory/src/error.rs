//! Error types for long-term memory operations

use std::error::Error as StdError;

/// Result alias used throughout the memory crate
pub type MnemosResult<T> = Result<T, MnemosError>;

/// Errors returned by the memory subsystem
///
/// A duplicate memory is not an error; the writer reports it as
/// [`StoreOutcome::Skipped`](crate::StoreOutcome::Skipped).
#[derive(Debug, thiserror::Error)]
pub enum MnemosError {
    /// Required service configuration is missing or invalid
    #[error("configuration error for `{setting}`: {message}")]
    Configuration {
        /// Name of the offending setting
        setting: String,
        /// What is wrong with it
        message: String,
    },

    /// The embedding service is unreachable or returned an unusable reply
    #[error("embedding operation `{operation}` failed: {message}")]
    Embedding {
        /// Operation that failed
        operation: String,
        /// Failure description
        message: String,
    },

    /// The vector store is unreachable or rejected a command
    #[error("vector store operation `{operation}` failed: {source}")]
    Store {
        /// Operation that failed
        operation: String,
        /// Underlying client error
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A stored record could not be reconstructed
    #[error("failed to parse stored field `{field}`: {message}")]
    Parse {
        /// Field that could not be read
        field: String,
        /// Failure description
        message: String,
    },

    /// Caller input violates a constraint
    #[error("validation failed for `{field}`: {constraint} (got {value})")]
    Validation {
        /// Field being validated
        field: String,
        /// Constraint that was violated
        constraint: String,
        /// Offending value
        value: String,
    },
}

impl MnemosError {
    /// Create a configuration error
    pub fn configuration(setting: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            setting: setting.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Embedding {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a vector store error wrapping the client error
    pub fn store<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Store {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a vector store error from a plain message
    pub fn store_message(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Store {
            operation: operation.into(),
            source: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(field: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.to_string(),
        }
    }

    /// Whether the error means a backing service could not be used
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::Store { .. })
    }
}
