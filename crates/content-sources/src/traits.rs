// FILE: crates/content-sources/src/traits.rs
//! Seams to the external metadata provider and remote audio hosts

use crate::SourceResult;
use async_trait::async_trait;
use std::path::Path;

/// One verse in a provider's numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderVerse {
    /// Provider-global number, used to build remote file names
    pub number: u32,
    /// Sequence number inside the chapter
    pub number_in_chapter: u16,
}

/// A chapter's verses as the provider numbers them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterNumbering {
    pub chapter: u16,
    pub verses: Vec<ProviderVerse>,
}

impl ChapterNumbering {
    /// Provider-global number of the verse with this in-chapter sequence
    pub fn global_number(&self, sequence: u16) -> Option<u32> {
        self.verses
            .iter()
            .find(|verse| verse.number_in_chapter == sequence)
            .map(|verse| verse.number)
    }
}

/// Maps chapters to provider numbering
///
/// Implementations own any response caching.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn chapter(&self, chapter: u16) -> SourceResult<ChapterNumbering>;
}

/// Fetches a remote file into a local path, replacing what is there
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch(&self, url: &str, destination: &Path) -> SourceResult<u64>;
}
