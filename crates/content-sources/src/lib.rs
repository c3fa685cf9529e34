// FILE: crates/content-sources/src/lib.rs
//! Reference audio for verserec
//!
//! [`AudioResolver`] turns an item id and a preferred [`AudioSource`] into a
//! playable local file. Lookups against the metadata provider and remote
//! fetches go through the [`MetadataProvider`] and [`AudioFetcher`] seams.

mod alquran;
mod fetcher;
mod resolver;
mod traits;

pub use alquran::AlQuranCloudProvider;
pub use fetcher::HttpFetcher;
pub use resolver::{AudioResolver, Provenance, ResolvedAudio, ResolverPaths};
pub use traits::{AudioFetcher, ChapterNumbering, MetadataProvider, ProviderVerse};
pub use verserec_core::AudioSource;

use std::fmt;
use verserec_core::{AppError, ItemId};
use verserec_network::NetworkError;

/// Result type for content source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from resolving reference audio
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Transport failure talking to a CDN or the provider
    Network(String),
    /// Provider answered but its payload could not be read
    Provider(String),
    /// Provider has no entry for this item
    ProviderMiss(ItemId),
    /// Local file system failure
    Io(String),
    /// No local file exists for a source that is never fetched
    Missing(String),
    /// Every step of the fallback chain failed; `cause` is the last failure
    Unresolvable { item: ItemId, cause: Box<SourceError> },
}

impl SourceError {
    /// The failure behind an [`SourceError::Unresolvable`], or `self`
    pub fn root_cause(&self) -> &SourceError {
        match self {
            SourceError::Unresolvable { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Network(e) => write!(f, "Network error: {}", e),
            SourceError::Provider(e) => write!(f, "Provider error: {}", e),
            SourceError::ProviderMiss(item) => write!(f, "Provider has no entry for {}", item),
            SourceError::Io(e) => write!(f, "I/O error: {}", e),
            SourceError::Missing(e) => write!(f, "Missing: {}", e),
            SourceError::Unresolvable { item, cause } => {
                write!(f, "No playable audio for {}: {}", item, cause)
            }
        }
    }
}

impl std::error::Error for SourceError {}

impl From<NetworkError> for SourceError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::InvalidResponse(e) => SourceError::Provider(e),
            NetworkError::Io(e) => SourceError::Io(e.to_string()),
            other => SourceError::Network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unresolvable { item, cause } => AppError::UnresolvableAudio {
                item,
                attempts: vec![cause.to_string()],
            },
            SourceError::Network(message) => AppError::NetworkFailure {
                message,
                source: None,
            },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}
