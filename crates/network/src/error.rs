// crates/network/src/error.rs
//! Network errors

use thiserror::Error;
use verserec_core::AppError;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be built from the caller's input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// The body did not decode into what the caller asked for
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Operation timed out")]
    Timeout,
}

impl NetworkError {
    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            NetworkError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Throttling, timeouts, 5xx and connection failures
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Timeout => true,
            NetworkError::Http(_) | NetworkError::Status { .. } => {
                self.status().map_or(true, |s| s == 429 || s >= 500)
            }
            _ => false,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }
}

impl From<NetworkError> for AppError {
    fn from(err: NetworkError) -> Self {
        AppError::network(err.to_string(), err)
    }
}
