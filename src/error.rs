//! Error types for hashvdb

use thiserror::Error;

/// Errors raised by vector math and ranking
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    /// Compared vectors have different lengths
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Errors raised by the entry store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Imported payload is unusable; the store was not modified
    #[error("Failed to import data: {0}")]
    ImportFormat(String),

    /// An entry with this id is already stored
    #[error("Duplicate entry id: {0}")]
    DuplicateId(String),

    /// Entry cannot be stored as-is; the store was not modified
    #[error("Invalid entry {id}: {reason}")]
    InvalidEntry { id: String, reason: String },

    /// Text was empty after trimming
    #[error("Cannot vectorize empty text")]
    EmptyText,

    /// JSON export failed
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an import format error
    pub fn import_format(msg: impl Into<String>) -> Self {
        Self::ImportFormat(msg.into())
    }
}

/// Result type for vector operations
pub type VectorResult<T> = std::result::Result<T, VectorError>;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
