// crates/sync-engine/src/uploader.rs
//! Sequential upload of recorded tracks

use crate::activity::Activity;
use crate::error::{SyncError, SyncResult};
use crate::ledger::RecordingLedger;
use crate::protocol::{
    track_file_name, RecordingData, UploadResponse, AUDIO_CONTENT_TYPE, AUDIO_FIELD,
    RECORDING_DATA_PARAM,
};
use crate::recorder::RecordingFiles;
use crate::types::{TrackState, UploadProfile};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use verserec_core::ItemId;
use verserec_network::{Client, MultipartUpload};

/// Everything needed to send one take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackUpload {
    pub recording: Uuid,
    pub item: ItemId,
    pub path: PathBuf,
    pub file_name: String,
    pub metadata: RecordingData,
}

/// Sends a take and returns the server-assigned remote id
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, track: &TrackUpload) -> SyncResult<String>;
}

/// Multipart POST to the recordings endpoint
pub struct HttpUploadTransport {
    client: Client,
    endpoint: String,
}

impl HttpUploadTransport {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(&self, track: &TrackUpload) -> SyncResult<String> {
        let bytes = tokio::fs::read(&track.path).await?;
        if bytes.is_empty() {
            return Err(SyncError::InvalidData(format!(
                "{} is empty",
                track.path.display()
            )));
        }

        let request = MultipartUpload::new(self.endpoint.clone(), track.file_name.clone(), bytes)
            .with_field(AUDIO_FIELD)
            .with_content_type(AUDIO_CONTENT_TYPE)
            .with_query(RECORDING_DATA_PARAM, serde_json::to_string(&track.metadata)?);

        let response: UploadResponse = self.client.upload(request).await?;
        if response.file_name.trim().is_empty() {
            return Err(SyncError::InvalidData(
                "response carried an empty file_name".to_string(),
            ));
        }
        Ok(response.file_name)
    }
}

/// Snapshot handed to the progress callback after each track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub recording: Uuid,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub current: Option<ItemId>,
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A track that stayed pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFailure {
    pub item: ItemId,
    pub reason: String,
}

/// Outcome of one upload run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub recording: Uuid,
    pub uploaded: Vec<ItemId>,
    pub failed: Vec<TrackFailure>,
    /// Tracks that already had a remote id or vanished mid-run
    pub skipped: Vec<ItemId>,
}

impl UploadReport {
    fn new(recording: Uuid) -> Self {
        Self {
            recording,
            uploaded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// False if any track is still waiting for a remote id
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Uploads pending tracks one at a time in item order
pub struct UploadCoordinator {
    ledger: Arc<RecordingLedger>,
    files: RecordingFiles,
    transport: Arc<dyn UploadTransport>,
    profile: UploadProfile,
    activity: Activity,
    on_progress: Option<ProgressCallback>,
}

impl UploadCoordinator {
    pub fn new(
        ledger: Arc<RecordingLedger>,
        files: RecordingFiles,
        transport: Arc<dyn UploadTransport>,
        activity: Activity,
    ) -> Self {
        Self {
            ledger,
            files,
            transport,
            profile: UploadProfile::default(),
            activity,
            on_progress: None,
        }
    }

    pub fn with_profile(mut self, profile: UploadProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Uploads every track of `recording` that has no remote id
    ///
    /// A failed track stays pending and does not stop the run; the report
    /// says whether anything is left. Fails with `AlreadyUploading` while
    /// another run is active and `AlreadyRecording` while capturing.
    pub async fn upload_pending(&self, recording: Uuid) -> SyncResult<UploadReport> {
        let _guard = self.activity.begin_upload()?;

        if self.ledger.has_pending() {
            Arc::clone(&self.ledger)
                .blocking(|ledger| ledger.flush())
                .await?;
        }

        let stored = self
            .ledger
            .get(recording)?
            .ok_or_else(|| SyncError::NotFound(recording.to_string()))?;
        let queue = stored.pending_items();
        let total = queue.len();

        let mut report = UploadReport::new(recording);
        report.skipped.extend(
            stored
                .tracks
                .iter()
                .filter(|(_, track)| track.state.is_uploaded())
                .map(|(item, _)| *item),
        );
        log::info!("Uploading {} track(s) of {}", total, recording);

        for item in queue {
            // The ledger may have changed while the previous track was in flight
            let current = self
                .ledger
                .get(recording)?
                .and_then(|r| r.track(item).map(|track| track.state.clone()));
            match current {
                Some(state) if !state.is_uploaded() => {}
                _ => {
                    log::debug!("Skipping {}: uploaded or deleted", item);
                    report.skipped.push(item);
                    continue;
                }
            }

            self.set_state(recording, item, TrackState::UploadPending)
                .await?;

            let track = TrackUpload {
                recording,
                item,
                path: self.files.path(recording, item),
                file_name: track_file_name(recording, item),
                metadata: RecordingData::for_item(item, &self.profile),
            };

            match self.transport.upload(&track).await {
                Ok(remote_id) => {
                    let state = TrackState::Uploaded {
                        remote_id: remote_id.clone(),
                    };
                    if self.set_state(recording, item, state).await? {
                        log::info!("Uploaded {} as {}", item, remote_id);
                        report.uploaded.push(item);
                    } else {
                        report.skipped.push(item);
                    }
                }
                Err(e) => {
                    log::warn!("Upload of {} failed, leaving it pending: {}", item, e);
                    report.failed.push(TrackFailure {
                        item,
                        reason: e.to_string(),
                    });
                }
            }

            self.report_progress(UploadProgress {
                recording,
                total,
                completed: report.uploaded.len(),
                failed: report.failed.len(),
                current: Some(item),
            });
        }

        if !report.is_complete() {
            log::warn!(
                "Upload of {} incomplete: {} track(s) still pending",
                recording,
                report.failed.len()
            );
        }
        Ok(report)
    }

    async fn set_state(&self, recording: Uuid, item: ItemId, state: TrackState) -> SyncResult<bool> {
        Arc::clone(&self.ledger)
            .blocking(move |ledger| ledger.set_track_state(recording, item, state))
            .await
    }

    fn report_progress(&self, progress: UploadProgress) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completeness() {
        let mut report = UploadReport::new(Uuid::nil());
        assert!(report.is_complete());
        report.failed.push(TrackFailure {
            item: ItemId::new(78, 1).unwrap(),
            reason: "503".to_string(),
        });
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_http_transport_rejects_missing_file() {
        let transport = HttpUploadTransport::new(
            Client::new().unwrap(),
            "https://example.com/recordings/upload",
        );
        let item = ItemId::new(78, 1).unwrap();
        let track = TrackUpload {
            recording: Uuid::nil(),
            item,
            path: PathBuf::from("/nonexistent/take.m4a"),
            file_name: track_file_name(Uuid::nil(), item),
            metadata: RecordingData::for_item(item, &UploadProfile::default()),
        };
        assert!(matches!(
            transport.upload(&track).await,
            Err(SyncError::Io(_))
        ));
    }
}
