// crates/sync-engine/src/ledger.rs
//! Durable ledger of range recordings
//!
//! The ledger is a JSON list of [`RangeRecording`]s rewritten atomically on
//! every mutation. Readers get the last committed snapshot; a mutation only
//! becomes visible once it is on disk. If a write fails the mutated list is
//! kept as pending, later mutations build on it, and [`RecordingLedger::flush`]
//! retries the write.

use crate::error::{SyncError, SyncResult};
use crate::types::{RangeRecording, TrackRecord, TrackState};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use uuid::Uuid;
use verserec_core::ItemId;

struct LedgerState {
    committed: Arc<Vec<RangeRecording>>,
    pending: Option<Vec<RangeRecording>>,
}

/// Single-writer store for range recordings
pub struct RecordingLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

impl RecordingLedger {
    /// Opens the ledger at `path`; a missing file is an empty ledger
    pub fn open(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        let recordings = match std::fs::read_to_string(&path) {
            Ok(json) if json.trim().is_empty() => Vec::new(),
            Ok(json) => serde_json::from_str::<Vec<RangeRecording>>(&json).map_err(|e| {
                SyncError::InvalidData(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No ledger at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Loaded {} range recording(s) from {}",
            recordings.len(),
            path.display()
        );

        Ok(Self {
            path,
            state: Mutex::new(LedgerState {
                committed: Arc::new(recordings),
                pending: None,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last committed list of recordings
    pub fn snapshot(&self) -> SyncResult<Arc<Vec<RangeRecording>>> {
        let state = self.state.lock().map_err(|_| SyncError::lock_poisoned())?;
        Ok(Arc::clone(&state.committed))
    }

    /// Committed copy of one recording
    pub fn get(&self, id: Uuid) -> SyncResult<Option<RangeRecording>> {
        Ok(self
            .snapshot()?
            .iter()
            .find(|recording| recording.id == id)
            .cloned())
    }

    /// True if a mutation failed to persist and awaits [`flush`](Self::flush)
    pub fn has_pending(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.pending.is_some())
            .unwrap_or(false)
    }

    /// Retries writing a pending mutation; returns whether anything was written
    pub fn flush(&self) -> SyncResult<bool> {
        let mut state = self.state.lock().map_err(|_| SyncError::lock_poisoned())?;
        let Some(pending) = state.pending.take() else {
            return Ok(false);
        };

        match self.write(&pending) {
            Ok(()) => {
                state.committed = Arc::new(pending);
                log::info!("Flushed pending ledger changes to {}", self.path.display());
                Ok(true)
            }
            Err(e) => {
                state.pending = Some(pending);
                Err(e)
            }
        }
    }

    /// Applies `change` to the latest list and persists it
    ///
    /// Recordings left without tracks are dropped before writing. If `change`
    /// fails nothing is modified.
    pub fn mutate<T, F>(&self, change: F) -> SyncResult<T>
    where
        F: FnOnce(&mut Vec<RangeRecording>) -> SyncResult<T>,
    {
        let mut state = self.state.lock().map_err(|_| SyncError::lock_poisoned())?;
        let mut next = match &state.pending {
            Some(pending) => pending.clone(),
            None => state.committed.as_ref().clone(),
        };

        let value = change(&mut next)?;
        next.retain(|recording| {
            if recording.tracks.is_empty() {
                log::info!("Range recording {} has no tracks left, removing", recording.id);
                false
            } else {
                true
            }
        });

        match self.write(&next) {
            Ok(()) => {
                state.committed = Arc::new(next);
                state.pending = None;
                Ok(value)
            }
            Err(e) => {
                log::error!("Ledger write failed, keeping change in memory: {}", e);
                state.pending = Some(next);
                Err(e)
            }
        }
    }

    /// Stores a fresh take for `item`, creating the recording if needed
    ///
    /// A re-recorded track starts over as [`TrackState::Recorded`].
    pub fn record_track(
        &self,
        id: Uuid,
        first: ItemId,
        last: ItemId,
        item: ItemId,
        label: Option<String>,
    ) -> SyncResult<()> {
        self.mutate(|recordings| {
            let index = match recordings.iter().position(|r| r.id == id) {
                Some(index) => index,
                None => {
                    recordings.push(RangeRecording::new(id, first, last));
                    recordings.len() - 1
                }
            };
            let recording = &mut recordings[index];
            recording.tracks.insert(item, TrackRecord::recorded(label));
            recording.touch();
            Ok(())
        })?;
        log::debug!("Recorded track {} in {}", item, id);
        Ok(())
    }

    /// Moves a track to `state`; returns false if the track does not exist
    pub fn set_track_state(&self, id: Uuid, item: ItemId, state: TrackState) -> SyncResult<bool> {
        self.mutate(|recordings| {
            let Some(recording) = recordings.iter_mut().find(|r| r.id == id) else {
                return Ok(false);
            };
            let Some(track) = recording.tracks.get_mut(&item) else {
                return Ok(false);
            };
            track.state = state;
            recording.touch();
            Ok(true)
        })
    }

    /// Removes the given tracks, or every track when `items` is `None`
    ///
    /// Returns the removed item ids. The recording disappears with its last
    /// track.
    pub fn remove_tracks(&self, id: Uuid, items: Option<&[ItemId]>) -> SyncResult<Vec<ItemId>> {
        self.mutate(|recordings| {
            let recording = recordings
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

            let removed: Vec<ItemId> = match items {
                Some(items) => items
                    .iter()
                    .filter(|item| recording.tracks.remove(*item).is_some())
                    .copied()
                    .collect(),
                None => std::mem::take(&mut recording.tracks).into_keys().collect(),
            };
            if !removed.is_empty() {
                recording.touch();
            }
            Ok(removed)
        })
    }

    /// Runs `op` on tokio's blocking pool
    ///
    /// Every mutation rewrites the ledger file; async callers go through here
    /// so the write does not hold up the runtime thread.
    pub async fn blocking<T, F>(self: Arc<Self>, op: F) -> SyncResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&RecordingLedger) -> SyncResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || op(&self))
            .await
            .map_err(|e| SyncError::Persistence {
                path,
                message: format!("ledger task failed: {}", e),
            })?
    }

    fn write(&self, recordings: &[RangeRecording]) -> SyncResult<()> {
        let persistence = |message: String| SyncError::Persistence {
            path: self.path.clone(),
            message,
        };

        let json = serde_json::to_vec_pretty(recordings)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| persistence(e.to_string()))?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| persistence(e.to_string()))?;
        temp_file
            .write_all(&json)
            .and_then(|_| temp_file.flush())
            .map_err(|e| persistence(e.to_string()))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| persistence(e.error.to_string()))?;

        log::debug!(
            "Wrote {} range recording(s) to {}",
            recordings.len(),
            self.path.display()
        );
        Ok(())
    }
}
