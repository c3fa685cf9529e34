//! Shared fakes for the media-engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use verserec_config::{MemoryPreferences, PlayerConfig};
use verserec_content_sources::{
    AudioFetcher, AudioResolver, ChapterNumbering, MetadataProvider, ResolverPaths, SourceError,
    SourceResult,
};
use verserec_core::{ContentIndex, Item, ItemId, PlaybackRate};
use verserec_media_engine::{AudioBackend, EngineResult, FinishSignal, PlaybackController};
use verserec_sync_engine::{
    AudioCapture, CaptureError, SyncResult, TrackUpload, UploadTransport,
};

pub fn id(chapter: u16, sequence: u16) -> ItemId {
    ItemId::new(chapter, sequence).unwrap()
}

/// Mono 16-bit PCM WAV at 8 kHz
pub fn wav_bytes(frames: u32) -> Vec<u8> {
    let sample_rate: u32 = 8000;
    let data_len = frames * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let sample = ((i % 40) as i16 - 20) * 800;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Chapter 1 (7 items) on page 1; chapter 78 (40 items) on pages 582-583
pub fn corpus() -> Arc<ContentIndex> {
    let mut items: Vec<Item> = (1..=7).map(|s| Item::new(id(1, s), 1)).collect();
    items.extend((1..=20).map(|s| Item::new(id(78, s), 582)));
    items.extend((21..=40).map(|s| Item::new(id(78, s), 583)));
    Arc::new(ContentIndex::new(items).with_chapter_names([(1, "Al-Fatiha"), (78, "An-Naba")]))
}

/// Serves WAV audio for every URL except the scripted failures
#[derive(Default)]
pub struct FakeFetcher {
    pub calls: AtomicUsize,
    offline: HashSet<String>,
    broken: HashSet<String>,
    all_offline: bool,
}

impl FakeFetcher {
    pub fn offline_for(items: &[ItemId]) -> Self {
        Self {
            offline: items.iter().map(|item| item.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn broken_for(items: &[ItemId]) -> Self {
        Self {
            broken: items.iter().map(|item| item.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            all_offline: true,
            ..Default::default()
        }
    }

    fn matches(set: &HashSet<String>, url: &str) -> bool {
        set.iter().any(|key| url.contains(key.as_str()))
    }
}

#[async_trait]
impl AudioFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> SourceResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.all_offline || Self::matches(&self.offline, url) {
            return Err(SourceError::Network(format!("{} unreachable", url)));
        }
        let bytes = if Self::matches(&self.broken, url) {
            b"<html>502 Bad Gateway</html>".to_vec()
        } else {
            wav_bytes(800)
        };
        tokio::fs::create_dir_all(destination.parent().unwrap()).await?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

/// The direct source never consults the provider
pub struct NoProvider;

#[async_trait]
impl MetadataProvider for NoProvider {
    async fn chapter(&self, chapter: u16) -> SourceResult<ChapterNumbering> {
        Err(SourceError::Provider(format!("no numbering for {}", chapter)))
    }
}

#[derive(Default)]
pub struct BackendLog {
    pub started: Vec<(PathBuf, f32)>,
    pub signals: Vec<FinishSignal>,
    pub pauses: usize,
    pub resumes: usize,
    pub stops: usize,
}

/// Records what the controller asked for; tests fire the finish signals
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub log: Arc<Mutex<BackendLog>>,
}

impl FakeBackend {
    pub fn started(&self) -> Vec<(PathBuf, f32)> {
        self.log.lock().unwrap().started.clone()
    }

    /// Fires the finish signal of the most recent start
    pub fn finish(&self) {
        let signal = self.log.lock().unwrap().signals.last().cloned();
        signal.expect("nothing started").finished();
    }

    /// Fires the signal of the first start, whatever came after it
    pub fn finish_first(&self) {
        let signal = self.log.lock().unwrap().signals.first().cloned();
        signal.expect("nothing started").finished();
    }
}

impl AudioBackend for FakeBackend {
    fn start(&mut self, path: &Path, rate: PlaybackRate, finished: FinishSignal) -> EngineResult<()> {
        let mut log = self.log.lock().unwrap();
        log.started.push((path.to_path_buf(), rate.value()));
        log.signals.push(finished);
        Ok(())
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().pauses += 1;
    }

    fn resume(&mut self) {
        self.log.lock().unwrap().resumes += 1;
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub resolver: Arc<AudioResolver>,
    pub fetcher: Arc<FakeFetcher>,
    pub backend: FakeBackend,
    pub preferences: Arc<MemoryPreferences>,
}

impl Fixture {
    pub fn new(fetcher: FakeFetcher) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let paths = ResolverPaths {
            bundled_dir: dir.path().join("bundled"),
            cache_dir: dir.path().join("cache"),
            recordings_dir: dir.path().join("recordings"),
        };
        let fetcher = Arc::new(fetcher);
        let resolver = Arc::new(AudioResolver::new(paths, Arc::new(NoProvider), fetcher.clone()));
        Self {
            dir,
            resolver,
            fetcher,
            backend: FakeBackend::default(),
            preferences: Arc::new(MemoryPreferences::new(PlayerConfig::default())),
        }
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.dir.path().join("recordings")
    }

    pub fn controller(&self, config: PlayerConfig) -> PlaybackController<FakeBackend> {
        PlaybackController::new(
            corpus(),
            &config,
            self.resolver.clone(),
            self.backend.clone(),
            self.preferences.clone(),
        )
    }
}

/// Microphone that writes a short WAV take
#[derive(Default)]
pub struct FakeCapture {
    pub stops: AtomicUsize,
    /// Refuse microphone access
    pub deny: AtomicBool,
}

#[async_trait]
impl AudioCapture for FakeCapture {
    async fn start(&self, destination: &Path) -> Result<(), CaptureError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied("microphone".to_string()));
        }
        tokio::fs::write(destination, wav_bytes(400))
            .await
            .map_err(|e| CaptureError::Device(e.to_string()))
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Upload transport that can be held until released
#[derive(Default)]
pub struct GatedTransport {
    pub sent: Mutex<Vec<ItemId>>,
    gate: Option<Arc<Notify>>,
}

impl GatedTransport {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl UploadTransport for GatedTransport {
    async fn upload(&self, track: &TrackUpload) -> SyncResult<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.sent.lock().unwrap().push(track.item);
        Ok(format!("remote-{}", track.item))
    }
}
