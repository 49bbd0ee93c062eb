//! Error types for store operations.

/// Errors returned by the pantry and recipe store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Stored or supplied JSON could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A record failed validation before being written.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
