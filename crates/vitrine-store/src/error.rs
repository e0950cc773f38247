//! Error types for the persistence layer.
//!
//! [`StoreError`] is returned by every store operation. Variants stay
//! coarse enough for exhaustive matching at the API and engine layers.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Requested product was not found.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// A stored row failed to decode into its domain type.
    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        /// Table the bad row came from.
        table: &'static str,
        /// Column that failed to decode.
        column: &'static str,
        /// What went wrong.
        detail: String,
    },
}

impl StoreError {
    /// Whether this error means the referenced record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::ProductNotFound(_))
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
