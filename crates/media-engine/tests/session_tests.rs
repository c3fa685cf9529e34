//! Practice session: playback, capture and upload sharing one screen

mod common;

use common::{id, FakeBackend, FakeCapture, FakeFetcher, Fixture, GatedTransport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use verserec_config::PlayerConfig;
use verserec_content_sources::Provenance;
use verserec_media_engine::{EngineError, Outcome, PlaybackState, PracticeSession};
use verserec_sync_engine::{
    Activity, RecordingFiles, RecordingLedger, RecordingSession, SyncError, TrackState,
    UploadCoordinator,
};

fn session(
    f: &Fixture,
    transport: GatedTransport,
) -> (
    PracticeSession<FakeBackend, FakeCapture>,
    Arc<RecordingLedger>,
) {
    let ledger = Arc::new(RecordingLedger::open(f.dir.path().join("ledger.json")).unwrap());
    let files = RecordingFiles::new(f.recordings_dir());
    let activity = Activity::new();
    let recorder = RecordingSession::new(
        FakeCapture::default(),
        ledger.clone(),
        files.clone(),
        activity.clone(),
    );
    let uploader = UploadCoordinator::new(ledger.clone(), files, Arc::new(transport), activity);
    let session = PracticeSession::new(
        f.controller(PlayerConfig::default()),
        recorder,
        Arc::new(uploader),
    );
    (session, ledger)
}

#[tokio::test]
async fn test_recording_stops_playback() {
    let f = Fixture::new(FakeFetcher::default());
    let (mut session, ledger) = session(&f, GatedTransport::default());

    session.player_mut().play(None).unwrap();
    session.player_mut().step().await;
    assert_eq!(session.player().state(), PlaybackState::Playing);

    let recording = session.record_current_range().unwrap();
    let item = session.start_recording(None).await.unwrap();
    assert_eq!(item, id(1, 1));
    assert_eq!(session.player().state(), PlaybackState::Idle);
    assert!(session.recorder().is_recording());

    assert_eq!(session.stop_recording().await.unwrap(), Some(id(1, 1)));
    let stored = ledger.get(recording).unwrap().unwrap();
    assert_eq!(stored.first, id(1, 1));
    assert_eq!(stored.last, id(1, 7));
    assert_eq!(
        stored.track(id(1, 1)).unwrap().label.as_deref(),
        Some("Al-Fatiha 1 : 7")
    );
}

#[tokio::test]
async fn test_second_recording_is_refused_without_stopping_playback() {
    let f = Fixture::new(FakeFetcher::default());
    let (mut session, _ledger) = session(&f, GatedTransport::default());

    session.start_recording(Some(id(1, 1))).await.unwrap();
    session.player_mut().play(Some(id(1, 2))).unwrap();
    session.player_mut().step().await;
    assert_eq!(session.player().state(), PlaybackState::Playing);

    let refused = session.start_recording(Some(id(1, 3))).await;
    assert!(matches!(
        refused,
        Err(EngineError::Recording(SyncError::AlreadyRecording))
    ));
    assert_eq!(session.player().state(), PlaybackState::Playing);
    assert_eq!(session.recorder().recording_item(), Some(id(1, 1)));
}

#[tokio::test]
async fn test_denied_microphone_keeps_playing() {
    let f = Fixture::new(FakeFetcher::default());
    let (mut session, ledger) = session(&f, GatedTransport::default());

    session.player_mut().play(None).unwrap();
    session.player_mut().step().await;
    session.recorder().capture().deny.store(true, Ordering::SeqCst);

    let result = session.start_recording(None).await;
    assert!(matches!(
        result,
        Err(EngineError::Recording(SyncError::PermissionDenied(_)))
    ));
    assert_eq!(session.player().state(), PlaybackState::Playing);
    assert!(!session.recorder().is_recording());
    assert!(ledger.snapshot().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_finalizes_running_take() {
    let f = Fixture::new(FakeFetcher::default());
    let (mut session, ledger) = session(&f, GatedTransport::default());

    let recording = session.record_current_range().unwrap();
    session.start_recording(Some(id(1, 2))).await.unwrap();

    let report = session.upload_pending(recording).await.unwrap();
    assert!(!session.recorder().is_recording());
    assert_eq!(report.uploaded, vec![id(1, 2)]);
    assert!(report.is_complete());

    let stored = ledger.get(recording).unwrap().unwrap();
    assert_eq!(
        stored.track(id(1, 2)).unwrap().state,
        TrackState::Uploaded {
            remote_id: "remote-001002".to_string()
        }
    );
}

#[tokio::test]
async fn test_recording_rejected_while_upload_runs() {
    let f = Fixture::new(FakeFetcher::default());
    let gate = Arc::new(Notify::new());
    let (mut session, _ledger) = session(&f, GatedTransport::gated(gate.clone()));

    let recording = session.record_current_range().unwrap();
    session.start_recording(Some(id(1, 1))).await.unwrap();
    session.stop_recording().await.unwrap();

    let upload = session.spawn_upload(recording).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !session.uploader().activity().is_uploading() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert!(matches!(
        session.start_recording(Some(id(1, 2))).await,
        Err(EngineError::Recording(SyncError::AlreadyUploading))
    ));

    // Playback is allowed alongside the upload
    session.player_mut().play(None).unwrap();
    assert!(matches!(
        session.player_mut().step().await,
        Outcome::Started(_)
    ));

    gate.notify_one();
    let report = upload.await.unwrap().unwrap();
    assert_eq!(report.uploaded, vec![id(1, 1)]);
    assert!(!session.uploader().activity().is_uploading());
}

#[tokio::test]
async fn test_own_takes_play_from_recordings() {
    let f = Fixture::new(FakeFetcher::default());
    let (mut session, _ledger) = session(&f, GatedTransport::default());

    let recording = session.record_current_range().unwrap();
    session.start_recording(Some(id(1, 4))).await.unwrap();
    session.stop_recording().await.unwrap();

    session.play_recording(recording, Some(id(1, 4))).unwrap();
    match session.player_mut().step().await {
        Outcome::Started(resolved) => {
            assert_eq!(resolved.provenance, Provenance::Recording);
            assert_eq!(resolved.item, id(1, 4));
        }
        other => panic!("expected a start, got {:?}", other),
    }

    assert!(session.delete_track(id(1, 4)).await.unwrap());
    assert_eq!(session.delete_all_tracks().await.unwrap(), 0);
}
