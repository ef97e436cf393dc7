//! Errors raised by the PostgreSQL layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostgresError {
    /// Anything sqlx reports: connection, query, row decoding
    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    /// A versioned migration did not apply cleanly
    #[error("Schema migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// Missing or malformed connection settings
    #[error("PostgreSQL configuration invalid: {0}")]
    Config(String),

    /// JSON column contents did not decode
    #[error("Stored JSON invalid: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failure_names_the_migration() {
        let err = PostgresError::MigrationFailed {
            version: 4,
            name: "add_report_definitions".to_string(),
            error: "relation already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Schema migration 4 (add_report_definitions) failed: relation already exists"
        );
    }

    #[test]
    fn test_config_error_carries_detail() {
        let err = PostgresError::Config("missing URL".to_string());
        assert_eq!(
            err.to_string(),
            "PostgreSQL configuration invalid: missing URL"
        );
    }
}
