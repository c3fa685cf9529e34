// crates/sync-engine/src/lib.rs
//! Recording ledger and upload synchronization
//!
//! This crate keeps the user's own recordings in step with the remote
//! recordings service:
//! - [`RecordingLedger`]: durable list of range recordings and per-track state
//! - [`RecordingSession`]: captures takes and files them in the ledger
//! - [`UploadCoordinator`]: uploads pending takes sequentially
//!
//! Recording and uploading exclude each other through a shared [`Activity`].
//!
//! # Example
//!
//! ```rust
//! use verserec_sync_engine::{RecordingLedger, TrackState};
//! use verserec_core::ItemId;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let ledger = RecordingLedger::open(dir.path().join("recordings.json")).unwrap();
//!
//! let id = uuid::Uuid::new_v4();
//! let item = ItemId::new(78, 1).unwrap();
//! ledger.record_track(id, item, item, item, None).unwrap();
//!
//! let recording = ledger.get(id).unwrap().unwrap();
//! assert_eq!(recording.track(item).unwrap().state, TrackState::Recorded);
//! ```

mod activity;
mod error;
mod ledger;
mod protocol;
mod recorder;
mod types;
mod uploader;

pub use activity::Activity;
pub use error::{SyncError, SyncResult};
pub use ledger::RecordingLedger;
pub use protocol::{track_file_name, RecordingData, UploadResponse, VersePosition};
pub use recorder::{
    delete_tracks, AudioCapture, CaptureError, RecordingFiles, RecordingSession, RecordingTarget,
};
pub use types::{RangeRecording, TrackRecord, TrackState, UploadProfile};
pub use uploader::{
    HttpUploadTransport, ProgressCallback, TrackFailure, TrackUpload, UploadCoordinator,
    UploadProgress, UploadReport, UploadTransport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: Activity = Activity::new();
        let _: UploadProfile = UploadProfile::default();
        let _: RecordingFiles = RecordingFiles::new("recordings");
    }
}
