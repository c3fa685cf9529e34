// FILE: crates/media-engine/src/backend.rs
//! Audio output seam and completion events

use crate::decoder;
use crate::error::{EngineError, EngineResult};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use verserec_content_sources::ResolvedAudio;
use verserec_core::{ItemId, PlaybackRate};

/// Events consumed by the playback controller
///
/// Every event carries the epoch of the load that produced it; the
/// controller drops events from superseded loads.
#[derive(Debug)]
pub enum PlaybackEvent {
    /// Resolution and probing of `item` completed
    Resolved {
        epoch: u64,
        item: ItemId,
        result: EngineResult<ResolvedAudio>,
    },
    /// The backend reached the end of the file
    Finished { epoch: u64 },
}

impl PlaybackEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            PlaybackEvent::Resolved { epoch, .. } | PlaybackEvent::Finished { epoch } => *epoch,
        }
    }
}

/// Handed to the backend with every file; fire it once playback ends
#[derive(Debug, Clone)]
pub struct FinishSignal {
    sender: UnboundedSender<PlaybackEvent>,
    epoch: u64,
}

impl FinishSignal {
    pub(crate) fn new(sender: UnboundedSender<PlaybackEvent>, epoch: u64) -> Self {
        Self { sender, epoch }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn finished(&self) {
        if self.sender.send(PlaybackEvent::Finished { epoch: self.epoch }).is_err() {
            log::debug!("Controller gone, dropping finish of epoch {}", self.epoch);
        }
    }
}

/// Plays one file at a time
pub trait AudioBackend: Send {
    /// Starts `path` from the beginning at `rate`, replacing anything playing
    fn start(&mut self, path: &Path, rate: PlaybackRate, finished: FinishSignal)
        -> EngineResult<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
}

struct Timer {
    task: Option<JoinHandle<()>>,
    remaining: Duration,
    started: Instant,
    signal: FinishSignal,
}

/// Backend without an output device: it measures each file and fires the
/// finish signal once the file's playing time has elapsed
///
/// Must be used inside a tokio runtime.
#[derive(Default)]
pub struct ClockBackend {
    timer: Option<Timer>,
}

impl ClockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| timer.task.is_some())
    }

    fn spawn(remaining: Duration, signal: FinishSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            signal.finished();
        })
    }
}

impl AudioBackend for ClockBackend {
    fn start(
        &mut self,
        path: &Path,
        rate: PlaybackRate,
        finished: FinishSignal,
    ) -> EngineResult<()> {
        self.stop();
        let info = decoder::probe(path)?;
        let remaining = info
            .playback_time(rate.value())
            .ok_or_else(|| EngineError::OutputError(format!("{} has no known length", path.display())))?;

        log::debug!("Pacing {} for {:?}", path.display(), remaining);
        self.timer = Some(Timer {
            task: Some(Self::spawn(remaining, finished.clone())),
            remaining,
            started: Instant::now(),
            signal: finished,
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(timer) = &mut self.timer {
            if let Some(task) = timer.task.take() {
                task.abort();
                timer.remaining = timer.remaining.saturating_sub(timer.started.elapsed());
            }
        }
    }

    fn resume(&mut self) {
        if let Some(timer) = &mut self.timer {
            if timer.task.is_none() {
                timer.started = Instant::now();
                timer.task = Some(Self::spawn(timer.remaining, timer.signal.clone()));
            }
        }
    }

    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            if let Some(task) = timer.task {
                task.abort();
            }
        }
    }
}

impl Drop for ClockBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tests::wav_bytes;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_clock_backend_fires_after_playing_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        // 0.1 s of audio, played at 2x
        std::fs::write(&path, wav_bytes(800)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut backend = ClockBackend::new();
        backend
            .start(&path, PlaybackRate::new(2.0).unwrap(), FinishSignal::new(tx, 7))
            .unwrap();
        assert!(backend.is_running());

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, PlaybackEvent::Finished { epoch: 7 }));
    }

    #[tokio::test]
    async fn test_clock_backend_stop_cancels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wav");
        std::fs::write(&path, wav_bytes(800)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        // The controller keeps its own sender, so the channel stays open
        let _held = tx.clone();
        let mut backend = ClockBackend::new();
        backend
            .start(&path, PlaybackRate::NORMAL, FinishSignal::new(tx, 1))
            .unwrap();
        backend.pause();
        assert!(!backend.is_running());
        backend.resume();
        backend.stop();

        let waited = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(
            !matches!(waited, Ok(Some(PlaybackEvent::Finished { .. }))),
            "stopped backend must not finish"
        );
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_clock_backend_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"garbage").unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = ClockBackend::new();
        let result = backend.start(&path, PlaybackRate::NORMAL, FinishSignal::new(tx, 1));
        assert!(matches!(result, Err(EngineError::DecodeError { .. })));
    }
}
