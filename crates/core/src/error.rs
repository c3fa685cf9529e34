//! Error types and recovery strategies for verserec
//!
//! Every crate in the workspace has its own error enum; all of them convert
//! into [`AppError`] so a front end only has to deal with one type.
//!
//! Errors fall into three severity tiers:
//! - **Recoverable**: handled locally (skip the item, leave the upload pending)
//! - **Degraded**: the operation was refused or failed and the user must be told
//! - **Fatal**: the session cannot continue without user intervention

use crate::types::ItemId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Skip the current item and move on
    Skip,
    /// Leave the work queued and retry on the next user action
    RetryLater,
    /// Reject the request, nothing changed
    Reject,
    /// Show the failure to the user; they decide what happens next
    SurfaceToUser,
    /// Stop the session
    SafeShutdown,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "Skipping item"),
            Self::RetryLater => write!(f, "Retrying later"),
            Self::Reject => write!(f, "Request rejected"),
            Self::SurfaceToUser => write!(f, "User attention required"),
            Self::SafeShutdown => write!(f, "Performing safe shutdown"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error is recovered from without involving the user
    Recoverable,
    /// Operation failed, session continues
    Degraded,
    /// Session cannot continue
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for verserec
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Audio resolution =====
    /// Every step of the fallback chain failed for an item
    #[error("No playable audio for item {item}: {}", attempts.join("; "))]
    UnresolvableAudio { item: ItemId, attempts: Vec<String> },

    /// A resolved file could not be decoded
    #[error("Audio decode failure for {path}: {message}")]
    DecodeFailure { path: PathBuf, message: String },

    // ===== Network =====
    /// Transient network failure; safe to retry on the next user action
    #[error("Network failure: {message}")]
    NetworkFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== State conflicts =====
    /// A recording is already in progress
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// An upload run is already in progress
    #[error("An upload run is already in progress")]
    AlreadyUploading,

    // ===== Storage =====
    /// The recording ledger could not be written
    #[error("Failed to persist {path}: {message}")]
    PersistenceFailure { path: PathBuf, message: String },

    /// Microphone or audio session activation was refused
    #[error("Permission denied: {operation}")]
    PermissionDenied { operation: String },

    /// Capture hardware failed
    #[error("Capture failed: {message}")]
    CaptureFailure { message: String },

    // ===== Input =====
    /// An item identifier could not be parsed or built
    #[error("Invalid item id '{value}': {reason}")]
    InvalidItemId { value: String, reason: String },

    /// The corpus file could not be read
    #[error("Corpus error: {reason}")]
    Corpus { reason: String },

    /// A referenced entity does not exist
    #[error("Not found: {entity} {identifier}")]
    NotFound { entity: String, identifier: String },

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ===== Generic =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnresolvableAudio { .. }
            | Self::DecodeFailure { .. }
            | Self::NetworkFailure { .. }
            | Self::AlreadyRecording
            | Self::AlreadyUploading => ErrorSeverity::Recoverable,

            Self::PersistenceFailure { .. }
            | Self::PermissionDenied { .. }
            | Self::CaptureFailure { .. }
            | Self::InvalidItemId { .. }
            | Self::NotFound { .. } => ErrorSeverity::Degraded,

            Self::Corpus { .. } | Self::Config { .. } | Self::Internal { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::UnresolvableAudio { .. } | Self::DecodeFailure { .. } => RecoveryAction::Skip,
            Self::NetworkFailure { .. } => RecoveryAction::RetryLater,
            Self::AlreadyRecording
            | Self::AlreadyUploading
            | Self::InvalidItemId { .. }
            | Self::NotFound { .. } => RecoveryAction::Reject,
            Self::PersistenceFailure { .. }
            | Self::PermissionDenied { .. }
            | Self::CaptureFailure { .. } => RecoveryAction::SurfaceToUser,
            Self::Corpus { .. } | Self::Config { .. } | Self::Internal { .. } => {
                RecoveryAction::SafeShutdown
            }
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::UnresolvableAudio { .. } | Self::DecodeFailure { .. } => {
                "Audio for this verse is not available. Skipping.".to_string()
            }
            Self::NetworkFailure { .. } => {
                "Cannot reach the server. Please check your connection.".to_string()
            }
            Self::AlreadyRecording => "A recording is already running.".to_string(),
            Self::AlreadyUploading => "Recordings are already being uploaded.".to_string(),
            Self::PersistenceFailure { .. } => {
                "Your recordings could not be saved. Please try again.".to_string()
            }
            Self::PermissionDenied { .. } => {
                "Microphone access is required to record. Please allow it in Settings."
                    .to_string()
            }
            Self::CaptureFailure { .. } => "Recording failed. Please try again.".to_string(),
            Self::InvalidItemId { value, .. } => format!("'{}' is not a valid verse.", value),
            Self::Corpus { .. } => "The text could not be loaded.".to_string(),
            Self::NotFound { entity, .. } => format!("The requested {} was not found.", entity),
            Self::Config { .. } => "Settings could not be loaded.".to_string(),
            Self::Internal { .. } => "An unexpected error occurred.".to_string(),
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if the failed work stays queued for a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self.recovery_action(), RecoveryAction::RetryLater)
    }

    /// Helper to create a network failure from any error type
    pub fn network<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::NetworkFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;
