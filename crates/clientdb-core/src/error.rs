//! Core error types

use thiserror::Error;

use clientdb_storage::StorageError;

#[derive(Error, Debug)]
pub enum ClientDbError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corrupt data in namespace {namespace}: {reason}")]
    CorruptData { namespace: String, reason: String },

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientDbError {
    /// True when the storage area ran out of space.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, ClientDbError::Storage(e) if e.is_quota_exceeded())
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ClientDbError::CorruptData { .. })
    }
}
