// FILE: crates/media-engine/src/error.rs

use std::path::PathBuf;
use thiserror::Error;
use verserec_content_sources::SourceError;
use verserec_core::{AppError, ItemId, RangeSelector};
use verserec_sync_engine::SyncError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Decode error for {path}: {message}")]
    DecodeError { path: PathBuf, message: String },

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("{0} is not in the corpus")]
    UnknownRange(RangeSelector),

    #[error("Item {0} is not in the corpus")]
    UnknownItem(ItemId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Audio unavailable: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Recording(#[from] SyncError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn decode(path: &std::path::Path, message: impl Into<String>) -> Self {
        EngineError::DecodeError {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DecodeError { path, message } => AppError::DecodeFailure { path, message },
            EngineError::Source(source) => source.into(),
            EngineError::Recording(sync) => sync.into(),
            EngineError::UnknownRange(selector) => AppError::NotFound {
                entity: "range".to_string(),
                identifier: selector.to_string(),
            },
            EngineError::UnknownItem(item) => AppError::NotFound {
                entity: "item".to_string(),
                identifier: item.to_string(),
            },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}
