//! Error types for the data-source registry.

use thiserror::Error;

/// Main error type for data-source operations.
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Configuration error (empty source list, malformed descriptor, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Descriptor variant or dialect the provider cannot build
    #[error("Unsupported data source: {0}")]
    Unsupported(String),

    /// Underlying pool construction failed for a descriptor
    #[error("Pool creation failed for {descriptor}: {message}")]
    PoolCreation { descriptor: String, message: String },

    /// Routing rule evaluation failed or selected an unknown shard
    #[error("Routing error: {0}")]
    Routing(String),

    /// Statement execution through a pooled handle failed
    #[error("Execution failed: {0}")]
    Execution(String),

    /// PostgreSQL driver error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Operation attempted after the registry was closed
    #[error("Data source registry is closed")]
    Closed,

    /// One or more handles failed to close during teardown
    #[error("Teardown failed for {} handle(s): {}", failures.len(), failures.join("; "))]
    Teardown { failures: Vec<String> },
}

impl DataSourceError {
    /// Create a PoolCreation error carrying the descriptor it failed for.
    pub fn pool_creation(descriptor: impl Into<String>, message: impl ToString) -> Self {
        DataSourceError::PoolCreation {
            descriptor: descriptor.into(),
            message: message.to_string(),
        }
    }

    /// Create an Execution error.
    pub fn execution(message: impl ToString) -> Self {
        DataSourceError::Execution(message.to_string())
    }
}

/// Result type alias for data-source operations.
pub type Result<T> = std::result::Result<T, DataSourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_creation_display_includes_descriptor() {
        let err = DataSourceError::pool_creation("postgres://ds0", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("postgres://ds0"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_teardown_display_joins_failures() {
        let err = DataSourceError::Teardown {
            failures: vec!["ds0: timeout".to_string(), "ds1: broken pipe".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 handle(s)"));
        assert!(msg.contains("ds0: timeout"));
        assert!(msg.contains("ds1: broken pipe"));
    }
}
