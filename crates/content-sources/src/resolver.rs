// FILE: crates/content-sources/src/resolver.rs
//! Audio resolution fallback chain
//!
//! For reference sources the first step that yields a file wins:
//!
//! 1. bundled asset `{bundled}/{itemId}.mp3`
//! 2. cached download `{cache}/{source}-{itemId}.mp3`
//! 3. direct remote `{base}/{itemId}.mp3` (sources with direct addressing)
//! 4. provider remap `{base}/{globalNumber}.mp3` (all other remote sources)
//!
//! Remote steps download into the cache path. Opening-formula items of every
//! chapter but the first resolve as `001000`. The user's own recordings are
//! only ever read from the recordings directory.

use crate::traits::{AudioFetcher, MetadataProvider};
use crate::{SourceError, SourceResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use verserec_core::{Addressing, AudioSource, ItemId};

/// Where a resolved file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    Bundled,
    Cached,
    DirectRemote,
    ProviderRemapped,
    Recording,
}

impl Provenance {
    /// True if resolving touched the network
    pub fn is_remote(&self) -> bool {
        matches!(self, Provenance::DirectRemote | Provenance::ProviderRemapped)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Bundled => write!(f, "bundled"),
            Provenance::Cached => write!(f, "cached"),
            Provenance::DirectRemote => write!(f, "downloaded"),
            Provenance::ProviderRemapped => write!(f, "downloaded (remapped)"),
            Provenance::Recording => write!(f, "recording"),
        }
    }
}

/// A playable local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAudio {
    /// Item that was asked for
    pub item: ItemId,
    /// Item whose audio the file holds (differs for substituted openings)
    pub audio_item: ItemId,
    pub path: PathBuf,
    pub provenance: Provenance,
}

/// Directories the resolver reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverPaths {
    pub bundled_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub recordings_dir: PathBuf,
}

impl ResolverPaths {
    pub fn bundled_path(&self, item: ItemId) -> PathBuf {
        self.bundled_dir.join(format!("{}.mp3", item))
    }

    /// `{cache}/{source}-{itemId}.{ext}`
    pub fn cache_path(&self, source: AudioSource, item: ItemId) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{}.{}", source.key(), item, source.extension()))
    }

    /// `{recordings}/{rangeRecordingId}-{itemId}.m4a`
    pub fn recording_path(&self, source: AudioSource, item: ItemId) -> Option<PathBuf> {
        match source {
            AudioSource::UserRecording(id) => Some(
                self.recordings_dir
                    .join(format!("{}-{}.{}", id, item, source.extension())),
            ),
            _ => None,
        }
    }
}

/// Resolves items to local audio files
pub struct AudioResolver {
    paths: ResolverPaths,
    provider: Arc<dyn MetadataProvider>,
    fetcher: Arc<dyn AudioFetcher>,
}

impl AudioResolver {
    pub fn new(
        paths: ResolverPaths,
        provider: Arc<dyn MetadataProvider>,
        fetcher: Arc<dyn AudioFetcher>,
    ) -> Self {
        Self {
            paths,
            provider,
            fetcher,
        }
    }

    pub fn paths(&self) -> &ResolverPaths {
        &self.paths
    }

    /// Produces a local path for `item` in `source`
    ///
    /// Fails with [`SourceError::Unresolvable`] carrying the last step's
    /// failure once every applicable step has been tried.
    pub async fn resolve(&self, item: ItemId, source: AudioSource) -> SourceResult<ResolvedAudio> {
        let unresolvable = |cause: SourceError| SourceError::Unresolvable {
            item,
            cause: Box::new(cause),
        };

        if let Some(path) = self.paths.recording_path(source, item) {
            return if is_usable(&path).await {
                Ok(ResolvedAudio {
                    item,
                    audio_item: item,
                    path,
                    provenance: Provenance::Recording,
                })
            } else {
                Err(unresolvable(SourceError::Missing(format!(
                    "no recording at {}",
                    path.display()
                ))))
            };
        }

        let audio_item = item.audio_id();
        if audio_item != item {
            log::debug!("{} plays the opening formula {}", item, audio_item);
        }
        let found = |path: PathBuf, provenance: Provenance| ResolvedAudio {
            item,
            audio_item,
            path,
            provenance,
        };

        let bundled = self.paths.bundled_path(audio_item);
        if is_usable(&bundled).await {
            return Ok(found(bundled, Provenance::Bundled));
        }

        let cache_path = self.paths.cache_path(source, audio_item);
        if is_usable(&cache_path).await {
            return Ok(found(cache_path, Provenance::Cached));
        }

        let (url, provenance) = match self.remote_url(audio_item, source).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Cannot locate remote audio for {}: {}", item, e);
                return Err(unresolvable(e));
            }
        };

        match self.fetcher.fetch(&url, &cache_path).await {
            Ok(bytes) => {
                log::info!(
                    "Cached {} ({} bytes) from {}",
                    cache_path.display(),
                    bytes,
                    url
                );
                Ok(found(cache_path, provenance))
            }
            Err(e) => {
                log::warn!("Download of {} failed: {}", url, e);
                Err(unresolvable(e))
            }
        }
    }

    /// Removes the cached file for `item`, e.g. after it failed to decode
    pub async fn evict(&self, item: ItemId, source: AudioSource) -> SourceResult<bool> {
        let path = self.paths.cache_path(source, item.audio_id());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Evicted {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remote_url(
        &self,
        item: ItemId,
        source: AudioSource,
    ) -> SourceResult<(String, Provenance)> {
        let base = source
            .base_url()
            .ok_or_else(|| SourceError::Missing(format!("{} has no remote", source)))?;

        match source.addressing() {
            Addressing::Direct => Ok((
                format!("{}/{}.{}", base, item, source.extension()),
                Provenance::DirectRemote,
            )),
            Addressing::ProviderRemapped => {
                let numbering = self.provider.chapter(item.chapter()).await?;
                let number = numbering
                    .global_number(item.sequence())
                    .ok_or(SourceError::ProviderMiss(item))?;
                Ok((
                    format!("{}/{}.{}", base, number, source.extension()),
                    Provenance::ProviderRemapped,
                ))
            }
            Addressing::LocalOnly => Err(SourceError::Missing(format!(
                "{} is only available locally",
                source
            ))),
        }
    }
}

/// A file counts as present only if it exists and is not empty
async fn is_usable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
