//! Common error types for ScreenMusic

use thiserror::Error;

/// Common result type for ScreenMusic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the dispatch layer and resource services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the database rejected a write on a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            #[cfg(feature = "sqlx")]
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!Error::Config("bad".to_string()).is_unique_violation());
        assert!(!Error::Internal("x".to_string()).is_unique_violation());
    }
}
