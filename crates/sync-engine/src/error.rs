// crates/sync-engine/src/error.rs
//! Error types for recording and upload operations

use std::path::PathBuf;
use thiserror::Error;
use verserec_core::AppError;
use verserec_network::NetworkError;

/// Result type for recording and upload operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the ledger, the recorder and the uploader
#[derive(Debug, Error)]
pub enum SyncError {
    /// A capture is already running
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// An upload run is already running
    #[error("An upload run is already in progress")]
    AlreadyUploading,

    /// Microphone or audio session refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Capture hardware failure
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Ledger write failed; the mutation is kept in memory until flushed
    #[error("Failed to persist ledger {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Unknown range recording or track
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error during upload
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid sync data
    #[error("Invalid sync data: {0}")]
    InvalidData(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl SyncError {
    pub(crate) fn lock_poisoned() -> Self {
        SyncError::Custom("Lock poisoned".to_string())
    }
}

impl From<NetworkError> for SyncError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::InvalidResponse(message) => SyncError::InvalidData(message),
            other => SyncError::Network(other.to_string()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AlreadyRecording => AppError::AlreadyRecording,
            SyncError::AlreadyUploading => AppError::AlreadyUploading,
            SyncError::PermissionDenied(operation) => AppError::PermissionDenied { operation },
            SyncError::Capture(message) => AppError::CaptureFailure { message },
            SyncError::Persistence { path, message } => {
                AppError::PersistenceFailure { path, message }
            }
            SyncError::NotFound(identifier) => AppError::NotFound {
                entity: "recording".to_string(),
                identifier,
            },
            SyncError::Network(message) => AppError::NetworkFailure {
                message,
                source: None,
            },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}
