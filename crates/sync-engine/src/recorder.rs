// crates/sync-engine/src/recorder.rs
//! Microphone capture for the tracks of a range recording

use crate::activity::Activity;
use crate::error::{SyncError, SyncResult};
use crate::ledger::RecordingLedger;
use crate::protocol::track_file_name;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use verserec_core::ItemId;

/// Failure reported by a capture device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("device error: {0}")]
    Device(String),
}

impl From<CaptureError> for SyncError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied(message) => SyncError::PermissionDenied(message),
            CaptureError::Device(message) => SyncError::Capture(message),
        }
    }
}

/// Microphone seam
///
/// `start` begins writing encoded audio to `destination`; `stop` finalizes
/// the file.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn start(&self, destination: &Path) -> Result<(), CaptureError>;
    async fn stop(&self) -> Result<(), CaptureError>;
}

/// Layout of take files: `{dir}/{rangeRecordingId}-{itemId}.m4a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFiles {
    dir: PathBuf,
}

impl RecordingFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, recording: Uuid, item: ItemId) -> PathBuf {
        self.dir.join(track_file_name(recording, item))
    }

    /// Where a take is written while capture is running
    pub fn partial_path(&self, recording: Uuid, item: ItemId) -> PathBuf {
        self.dir
            .join(format!("{}.partial", track_file_name(recording, item)))
    }

    /// Deletes a take; a missing file is not an error
    pub async fn remove(&self, recording: Uuid, item: ItemId) -> SyncResult<()> {
        remove_if_exists(&self.path(recording, item)).await
    }
}

async fn remove_if_exists(path: &Path) -> SyncResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Removes tracks and their files from a range recording
///
/// `None` removes every track. Returns the removed items.
pub async fn delete_tracks(
    ledger: &Arc<RecordingLedger>,
    files: &RecordingFiles,
    recording: Uuid,
    items: Option<&[ItemId]>,
) -> SyncResult<Vec<ItemId>> {
    let items = items.map(<[ItemId]>::to_vec);
    let removed = Arc::clone(ledger)
        .blocking(move |ledger| ledger.remove_tracks(recording, items.as_deref()))
        .await?;
    for item in &removed {
        files.remove(recording, *item).await?;
    }
    log::info!("Deleted {} track(s) of {}", removed.len(), recording);
    Ok(removed)
}

/// The range recording new takes are filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingTarget {
    pub id: Uuid,
    pub first: ItemId,
    pub last: ItemId,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTake {
    recording: Uuid,
    item: ItemId,
}

/// Records one take at a time into the ledger
pub struct RecordingSession<C: AudioCapture> {
    capture: C,
    ledger: Arc<RecordingLedger>,
    files: RecordingFiles,
    activity: Activity,
    target: Option<RecordingTarget>,
    active: Option<ActiveTake>,
}

impl<C: AudioCapture> RecordingSession<C> {
    pub fn new(
        capture: C,
        ledger: Arc<RecordingLedger>,
        files: RecordingFiles,
        activity: Activity,
    ) -> Self {
        Self {
            capture,
            ledger,
            files,
            activity,
            target: None,
            active: None,
        }
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn ledger(&self) -> &Arc<RecordingLedger> {
        &self.ledger
    }

    pub fn target(&self) -> Option<&RecordingTarget> {
        self.target.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Item currently being captured
    pub fn recording_item(&self) -> Option<ItemId> {
        self.active.map(|take| take.item)
    }

    /// Starts a new range recording for `first..=last`
    ///
    /// Nothing is stored until the first take completes.
    pub fn select_range(
        &mut self,
        first: ItemId,
        last: ItemId,
        label: Option<String>,
    ) -> SyncResult<Uuid> {
        if self.active.is_some() {
            return Err(SyncError::AlreadyRecording);
        }
        let id = Uuid::new_v4();
        self.target = Some(RecordingTarget {
            id,
            first,
            last,
            label,
        });
        Ok(id)
    }

    /// Continues adding takes to a stored range recording
    pub fn resume(&mut self, id: Uuid) -> SyncResult<()> {
        if self.active.is_some() {
            return Err(SyncError::AlreadyRecording);
        }
        let recording = self
            .ledger
            .get(id)?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        let label = recording
            .tracks
            .values()
            .find_map(|track| track.label.clone());
        self.target = Some(RecordingTarget {
            id,
            first: recording.first,
            last: recording.last,
            label,
        });
        Ok(())
    }

    /// Begins capturing a take for `item`
    ///
    /// Without a selected range a single-item range is started. Capture
    /// failures leave the ledger untouched.
    pub async fn start_recording(&mut self, item: ItemId) -> SyncResult<()> {
        if self.active.is_some() {
            return Err(SyncError::AlreadyRecording);
        }
        self.activity.begin_recording()?;

        let target = self.target.get_or_insert_with(|| RecordingTarget {
            id: Uuid::new_v4(),
            first: item,
            last: item,
            label: None,
        });
        let recording = target.id;
        let partial = self.files.partial_path(recording, item);

        let started = async {
            tokio::fs::create_dir_all(self.files.dir()).await?;
            self.capture.start(&partial).await?;
            Ok::<(), SyncError>(())
        }
        .await;

        if let Err(e) = started {
            log::warn!("Could not start recording {}: {}", item, e);
            self.activity.end_recording();
            if let Err(cleanup) = remove_if_exists(&partial).await {
                log::debug!("Leaving {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }

        log::info!("Recording {} into {}", item, partial.display());
        self.active = Some(ActiveTake { recording, item });
        Ok(())
    }

    /// Finalizes the running take and records it in the ledger
    ///
    /// Returns the recorded item, or `None` if nothing was being captured.
    pub async fn stop_recording(&mut self) -> SyncResult<Option<ItemId>> {
        let Some(take) = self.active.take() else {
            return Ok(None);
        };
        let result = self.finish_take(take).await;
        self.activity.end_recording();
        result.map(|_| Some(take.item))
    }

    async fn finish_take(&self, take: ActiveTake) -> SyncResult<()> {
        let partial = self.files.partial_path(take.recording, take.item);

        if let Err(e) = self.capture.stop().await {
            log::warn!("Capture of {} failed on stop: {}", take.item, e);
            remove_if_exists(&partial).await?;
            return Err(e.into());
        }

        let path = self.files.path(take.recording, take.item);
        tokio::fs::rename(&partial, &path).await?;

        let (first, last, label) = match &self.target {
            Some(target) if target.id == take.recording => {
                (target.first, target.last, target.label.clone())
            }
            _ => (take.item, take.item, None),
        };
        let (recording, item) = (take.recording, take.item);
        Arc::clone(&self.ledger)
            .blocking(move |ledger| ledger.record_track(recording, first, last, item, label))
            .await?;

        log::info!("Recorded {} to {}", take.item, path.display());
        Ok(())
    }

    /// Aborts the running take without touching the ledger
    pub async fn cancel_recording(&mut self) -> SyncResult<bool> {
        let Some(take) = self.active.take() else {
            return Ok(false);
        };
        if let Err(e) = self.capture.stop().await {
            log::warn!("Capture of {} failed on cancel: {}", take.item, e);
        }
        self.activity.end_recording();
        remove_if_exists(&self.files.partial_path(take.recording, take.item)).await?;
        log::info!("Discarded take for {}", take.item);
        Ok(true)
    }

    /// Deletes one track of the selected range recording
    pub async fn delete_track(&mut self, item: ItemId) -> SyncResult<bool> {
        Ok(!self.delete(Some(&[item])).await?.is_empty())
    }

    /// Deletes every track of the selected range recording
    pub async fn delete_all_tracks(&mut self) -> SyncResult<usize> {
        Ok(self.delete(None).await?.len())
    }

    async fn delete(&mut self, items: Option<&[ItemId]>) -> SyncResult<Vec<ItemId>> {
        self.cancel_recording().await?;

        let Some(target) = &self.target else {
            return Err(SyncError::NotFound("no range recording selected".to_string()));
        };
        if self.ledger.get(target.id)?.is_none() {
            return Ok(Vec::new());
        }
        delete_tracks(&self.ledger, &self.files, target.id, items).await
    }
}

impl<C: AudioCapture> Drop for RecordingSession<C> {
    fn drop(&mut self) {
        if self.active.is_some() {
            self.activity.end_recording();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_layout() {
        let files = RecordingFiles::new("/data/recordings");
        let id = Uuid::nil();
        let item = ItemId::new(78, 1).unwrap();
        assert_eq!(
            files.path(id, item),
            PathBuf::from(format!("/data/recordings/{}-078001.m4a", id))
        );
        assert!(files
            .partial_path(id, item)
            .to_string_lossy()
            .ends_with("078001.m4a.partial"));
    }

    #[test]
    fn test_capture_error_mapping() {
        assert!(matches!(
            SyncError::from(CaptureError::PermissionDenied("mic".into())),
            SyncError::PermissionDenied(_)
        ));
        assert!(matches!(
            SyncError::from(CaptureError::Device("busy".into())),
            SyncError::Capture(_)
        ));
    }
}
