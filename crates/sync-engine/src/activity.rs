// crates/sync-engine/src/activity.rs
//! Mutual exclusion between capture and upload runs

use crate::error::{SyncError, SyncResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flags shared by every recorder and uploader of one session
#[derive(Debug, Clone, Default)]
pub struct Activity {
    recording: Arc<AtomicBool>,
    uploading: Arc<AtomicBool>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Claims the recorder slot
    pub(crate) fn begin_recording(&self) -> SyncResult<()> {
        self.recording
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::AlreadyRecording)?;
        if self.is_uploading() {
            self.end_recording();
            return Err(SyncError::AlreadyUploading);
        }
        Ok(())
    }

    pub(crate) fn end_recording(&self) {
        self.recording.store(false, Ordering::SeqCst);
    }

    /// Claims the uploader slot until the guard is dropped
    pub(crate) fn begin_upload(&self) -> SyncResult<UploadGuard> {
        self.uploading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::AlreadyUploading)?;
        if self.is_recording() {
            self.uploading.store(false, Ordering::SeqCst);
            return Err(SyncError::AlreadyRecording);
        }
        Ok(UploadGuard {
            flag: Arc::clone(&self.uploading),
        })
    }
}

/// Releases the upload slot on drop
pub(crate) struct UploadGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
