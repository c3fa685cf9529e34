// FILE: crates/media-engine/src/session.rs
//! Playback, recording and upload for one practice screen

use crate::backend::AudioBackend;
use crate::controller::PlaybackController;
use crate::error::{EngineError, EngineResult};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;
use verserec_core::{AudioSource, ItemId};
use verserec_sync_engine::{
    AudioCapture, RecordingSession, SyncError, SyncResult, UploadCoordinator, UploadReport,
};

/// Owns the player and the recorder and shares the uploader
///
/// Recording stops playback. Starting an upload finalizes a running take
/// first, since capture and upload never overlap. Playback may continue
/// while an upload runs.
pub struct PracticeSession<B: AudioBackend, C: AudioCapture> {
    player: PlaybackController<B>,
    recorder: RecordingSession<C>,
    uploader: Arc<UploadCoordinator>,
}

impl<B: AudioBackend, C: AudioCapture> PracticeSession<B, C> {
    pub fn new(
        player: PlaybackController<B>,
        recorder: RecordingSession<C>,
        uploader: Arc<UploadCoordinator>,
    ) -> Self {
        Self {
            player,
            recorder,
            uploader,
        }
    }

    pub fn player(&self) -> &PlaybackController<B> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlaybackController<B> {
        &mut self.player
    }

    pub fn recorder(&self) -> &RecordingSession<C> {
        &self.recorder
    }

    pub fn uploader(&self) -> &Arc<UploadCoordinator> {
        &self.uploader
    }

    /// Opens a new range recording covering the current navigation range
    pub fn record_current_range(&mut self) -> EngineResult<Uuid> {
        let navigation = self.player.navigation();
        let range = navigation.range();
        let (Some(first), Some(last)) = (range.first(), range.last()) else {
            return Err(EngineError::InvalidState(format!(
                "{} has no items to record",
                range.selector()
            )));
        };
        let label = Some(navigation.label().to_string()).filter(|label| !label.is_empty());
        Ok(self.recorder.select_range(first, last, label)?)
    }

    /// Stops playback and starts capturing `item` (default: the active item)
    ///
    /// A rejected or failed start leaves playback as it was.
    pub async fn start_recording(&mut self, item: Option<ItemId>) -> EngineResult<ItemId> {
        if self.recorder.is_recording() {
            return Err(SyncError::AlreadyRecording.into());
        }
        if self.uploader.activity().is_uploading() {
            return Err(SyncError::AlreadyUploading.into());
        }
        let item = item
            .or_else(|| self.player.active())
            .or_else(|| self.player.navigation().range().first())
            .ok_or_else(|| EngineError::InvalidState("nothing to record".to_string()))?;

        // Silent while the microphone opens; a refused capture resumes playback
        let was_playing = self.player.state().is_playing();
        self.player.pause();
        if let Err(e) = self.recorder.start_recording(item).await {
            if was_playing {
                self.player.resume();
            }
            return Err(e.into());
        }
        self.player.stop();
        Ok(item)
    }

    pub async fn stop_recording(&mut self) -> EngineResult<Option<ItemId>> {
        Ok(self.recorder.stop_recording().await?)
    }

    pub async fn delete_track(&mut self, item: ItemId) -> EngineResult<bool> {
        Ok(self.recorder.delete_track(item).await?)
    }

    pub async fn delete_all_tracks(&mut self) -> EngineResult<usize> {
        Ok(self.recorder.delete_all_tracks().await?)
    }

    /// Plays back the user's takes of `recording`
    pub fn play_recording(&mut self, recording: Uuid, item: Option<ItemId>) -> EngineResult<()> {
        if self.recorder.is_recording() {
            return Err(SyncError::AlreadyRecording.into());
        }
        self.player.set_source(AudioSource::UserRecording(recording));
        self.player.play(item)
    }

    /// Uploads the pending tracks of `recording` and waits for the report
    pub async fn upload_pending(&mut self, recording: Uuid) -> EngineResult<UploadReport> {
        self.finalize_capture().await?;
        Ok(self.uploader.upload_pending(recording).await?)
    }

    /// Starts an upload run in the background
    ///
    /// The player stays usable while the run is in flight.
    pub async fn spawn_upload(
        &mut self,
        recording: Uuid,
    ) -> EngineResult<JoinHandle<SyncResult<UploadReport>>> {
        self.finalize_capture().await?;
        let uploader = Arc::clone(&self.uploader);
        Ok(tokio::spawn(async move {
            uploader.upload_pending(recording).await
        }))
    }

    async fn finalize_capture(&mut self) -> EngineResult<()> {
        if let Some(item) = self.recorder.recording_item() {
            log::info!("Stopping capture of {} before uploading", item);
            self.recorder.stop_recording().await?;
        }
        Ok(())
    }
}
