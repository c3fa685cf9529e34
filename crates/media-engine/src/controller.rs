// FILE: crates/media-engine/src/controller.rs
//! Playback controller
//!
//! Drives one backend over the active item of a [`NavigationState`].
//! Resolution runs on a spawned task; its result and the backend's
//! completion come back as [`PlaybackEvent`]s that are applied by
//! [`PlaybackController::step`]. Each load bumps an epoch, and events from
//! older loads are dropped.

use crate::backend::{AudioBackend, FinishSignal, PlaybackEvent};
use crate::decoder;
use crate::error::{EngineError, EngineResult};
use crate::navigation::{NavigationState, Step};
use crate::state::PlaybackState;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use verserec_config::{PlayerConfig, PreferenceChange, PreferenceStore};
use verserec_content_sources::{AudioResolver, Provenance, ResolvedAudio};
use verserec_core::{AudioSource, ContentIndex, ItemId, NavigationMode, PlaybackRate, RangeSelector};

/// What applying one event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend started playing
    Started(ResolvedAudio),
    /// The item could not be played and was treated as finished
    Skipped { item: ItemId, reason: String },
    /// The item played to its end
    Finished(ItemId),
    /// The event belonged to a superseded load
    Stale,
}

pub struct PlaybackController<B: AudioBackend> {
    navigation: NavigationState,
    resolver: Arc<AudioResolver>,
    backend: B,
    preferences: Arc<dyn PreferenceStore>,
    state: PlaybackState,
    rate: PlaybackRate,
    repeat: bool,
    follow_chapters: bool,
    source: AudioSource,
    epoch: u64,
    loading: Option<ItemId>,
    loaded: Option<ResolvedAudio>,
    failures: usize,
    events_tx: UnboundedSender<PlaybackEvent>,
    events_rx: UnboundedReceiver<PlaybackEvent>,
}

impl<B: AudioBackend> PlaybackController<B> {
    /// Builds a controller positioned where `config` left off
    pub fn new(
        index: Arc<ContentIndex>,
        config: &PlayerConfig,
        resolver: Arc<AudioResolver>,
        backend: B,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let navigation = NavigationState::with_position(
            index,
            config.navigation_mode,
            config.page_index,
            config.chapter_index,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            navigation,
            resolver,
            backend,
            preferences,
            state: PlaybackState::Idle,
            rate: config.rate,
            repeat: config.repeat_range,
            follow_chapters: config.follow_chapters,
            source: config.audio_source,
            epoch: 0,
            loading: None,
            loaded: None,
            failures: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn source(&self) -> AudioSource {
        self.source
    }

    pub fn active(&self) -> Option<ItemId> {
        self.navigation.active()
    }

    /// Item whose audio is being resolved
    pub fn loading(&self) -> Option<ItemId> {
        self.loading
    }

    /// File handed to the backend, while playing or paused
    pub fn loaded(&self) -> Option<&ResolvedAudio> {
        self.loaded.as_ref()
    }

    /// Starts `item`, or the active item, or the first item of the range
    ///
    /// An item outside the current range moves the range to the page or
    /// chapter containing it.
    pub fn play(&mut self, item: Option<ItemId>) -> EngineResult<()> {
        let target = match item {
            Some(item) => {
                self.focus(item)?;
                Some(item)
            }
            None => self.navigation.active().or_else(|| self.navigation.restart()),
        };

        match target {
            Some(item) => {
                self.failures = 0;
                self.load(item);
            }
            None => {
                log::info!("Nothing to play in {}", self.navigation.range().selector());
                self.halt();
            }
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing && self.transition(PlaybackState::Paused) {
            self.backend.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused && self.transition(PlaybackState::Playing) {
            self.backend.resume();
        }
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Stops playback and drops any load in flight
    pub fn stop(&mut self) {
        self.halt();
    }

    /// Changes the rate; a loaded file restarts from its beginning
    pub fn set_rate(&mut self, rate: PlaybackRate) -> EngineResult<()> {
        self.rate = rate;
        self.persist(PreferenceChange::Rate(rate));

        let Some(loaded) = self.loaded.clone() else {
            return Ok(());
        };
        let was_paused = self.state == PlaybackState::Paused;
        self.backend.stop();
        self.epoch += 1;
        self.transition(PlaybackState::Loading);
        let signal = FinishSignal::new(self.events_tx.clone(), self.epoch);
        if let Err(e) = self.backend.start(&loaded.path, rate, signal) {
            log::warn!("Restart of {} at {} failed: {}", loaded.item, rate, e);
            self.halt();
            return Err(e);
        }
        self.transition(PlaybackState::Playing);
        if was_paused {
            self.pause();
        }
        log::debug!("Restarted {} at {}", loaded.item, rate);
        Ok(())
    }

    /// Steps to the next rate of the cycle
    pub fn cycle_rate(&mut self) -> EngineResult<PlaybackRate> {
        let rate = self.rate.next();
        self.set_rate(rate)?;
        Ok(rate)
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
        self.persist(PreferenceChange::Repeat(repeat));
    }

    pub fn set_follow_chapters(&mut self, follow: bool) {
        self.follow_chapters = follow;
    }

    /// Switches the reference audio; an engaged item reloads from the new source
    pub fn set_source(&mut self, source: AudioSource) {
        if source == self.source {
            return;
        }
        self.source = source;
        self.persist(PreferenceChange::Source(source));
        if self.state.is_engaged() {
            if let Some(item) = self.navigation.active() {
                self.load(item);
            }
        }
    }

    /// Selects a page or chapter range; playback continues from its first item
    pub fn set_range(&mut self, selector: RangeSelector) -> EngineResult<()> {
        self.navigation.set_range(selector)?;
        self.after_range_change();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: NavigationMode) {
        self.navigation.set_mode(mode);
        self.after_range_change();
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.navigation.set_page_index(page_index);
        self.after_range_change();
    }

    pub fn set_chapter_index(&mut self, chapter_index: usize) {
        self.navigation.set_chapter_index(chapter_index);
        self.after_range_change();
    }

    /// Moves to the following item, crossing ranges as navigation allows
    pub fn next(&mut self) -> Step {
        let before = self.position();
        let step = self.navigation.advance(self.repeat);
        self.follow(step, before)
    }

    /// Moves to the preceding item
    pub fn previous(&mut self) -> Step {
        let before = self.position();
        let step = self.navigation.retreat();
        self.follow(step, before)
    }

    /// Applies the advancement policy for a finished item
    ///
    /// The range continues, then repeats if enabled, then moves on to the
    /// next page (or chapter when following chapters). Otherwise playback
    /// stops.
    pub fn on_finished(&mut self) {
        if let Some(item) = self.navigation.next_in_range() {
            self.load(item);
            return;
        }
        if self.repeat {
            if let Some(item) = self.navigation.restart() {
                log::debug!("Repeating {}", self.navigation.range().selector());
                self.load(item);
                return;
            }
        }
        let crosses = self.navigation.mode() == NavigationMode::ByPage || self.follow_chapters;
        if crosses {
            if let Some(item) = self.navigation.next_range() {
                self.persist_position();
                self.load(item);
                return;
            }
        }
        log::info!("Reached the end of {}", self.navigation.range().selector());
        self.halt();
        self.navigation.clear_active();
    }

    /// Waits for the next event and applies it
    pub async fn step(&mut self) -> Outcome {
        match self.events_rx.recv().await {
            Some(event) => self.handle(event),
            // The controller holds a sender, so the channel never closes
            None => Outcome::Stale,
        }
    }

    /// Applies a pending event without waiting
    pub fn try_step(&mut self) -> Option<Outcome> {
        self.events_rx.try_recv().ok().map(|event| self.handle(event))
    }

    fn handle(&mut self, event: PlaybackEvent) -> Outcome {
        if event.epoch() != self.epoch {
            log::debug!(
                "Discarding stale event from epoch {} (current {})",
                event.epoch(),
                self.epoch
            );
            return Outcome::Stale;
        }

        match event {
            PlaybackEvent::Resolved { item, result, .. } => {
                self.loading = None;
                match result.and_then(|resolved| self.start_backend(resolved)) {
                    Ok(resolved) => {
                        self.failures = 0;
                        Outcome::Started(resolved)
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {}", item, e);
                        self.skip();
                        Outcome::Skipped {
                            item,
                            reason: e.to_string(),
                        }
                    }
                }
            }
            PlaybackEvent::Finished { .. } => {
                let finished = self.loaded.take().map(|loaded| loaded.item);
                self.on_finished();
                match finished {
                    Some(item) => Outcome::Finished(item),
                    None => Outcome::Stale,
                }
            }
        }
    }

    fn start_backend(&mut self, resolved: ResolvedAudio) -> EngineResult<ResolvedAudio> {
        if !self.state.can_transition_to(PlaybackState::Playing) {
            return Err(EngineError::InvalidState(format!(
                "cannot start {} while {}",
                resolved.item, self.state
            )));
        }
        let signal = FinishSignal::new(self.events_tx.clone(), self.epoch);
        self.backend.start(&resolved.path, self.rate, signal)?;
        log::info!(
            "Playing {} ({}) at {}",
            resolved.item,
            resolved.provenance,
            self.rate
        );
        self.transition(PlaybackState::Playing);
        self.loaded = Some(resolved.clone());
        Ok(resolved)
    }

    /// Treats an unplayable item as finished, unless the whole range failed
    fn skip(&mut self) {
        self.failures += 1;
        if self.failures >= self.navigation.range().len().max(1) {
            log::warn!(
                "No playable audio in {}, stopping",
                self.navigation.range().selector()
            );
            self.failures = 0;
            self.halt();
            return;
        }
        self.on_finished();
    }

    fn load(&mut self, item: ItemId) {
        self.backend.stop();
        self.epoch += 1;
        self.transition(PlaybackState::Loading);
        self.loading = Some(item);
        self.loaded = None;

        let epoch = self.epoch;
        let source = self.source;
        let resolver = Arc::clone(&self.resolver);
        let events = self.events_tx.clone();
        log::debug!("Loading {} from {} (epoch {})", item, source, epoch);

        tokio::spawn(async move {
            let result = resolve_playable(&resolver, item, source).await;
            if events
                .send(PlaybackEvent::Resolved {
                    epoch,
                    item,
                    result,
                })
                .is_err()
            {
                log::debug!("Controller gone, dropping resolution of {}", item);
            }
        });
    }

    /// Moves the state machine; refused moves leave the state as it is
    fn transition(&mut self, next: PlaybackState) -> bool {
        if !self.state.can_transition_to(next) {
            log::warn!("Ignoring playback transition {} -> {}", self.state, next);
            return false;
        }
        if self.state != next {
            log::trace!("Playback {} -> {}", self.state, next);
        }
        self.state = next;
        true
    }

    fn halt(&mut self) {
        if self.state.is_engaged() {
            self.backend.stop();
        }
        self.epoch += 1;
        self.transition(PlaybackState::Idle);
        self.loading = None;
        self.loaded = None;
    }

    fn focus(&mut self, item: ItemId) -> EngineResult<()> {
        if self.navigation.set_active(item) {
            return Ok(());
        }
        let index = Arc::clone(self.navigation.index());
        let selector = match self.navigation.mode() {
            NavigationMode::ByPage => index.page_of(item).map(RangeSelector::Page),
            NavigationMode::ByChapter => index
                .contains(item)
                .then_some(RangeSelector::Chapter(item.chapter())),
        }
        .ok_or(EngineError::UnknownItem(item))?;

        self.navigation.set_range(selector)?;
        self.persist_position();
        if self.navigation.set_active(item) {
            Ok(())
        } else {
            Err(EngineError::UnknownItem(item))
        }
    }

    fn follow(&mut self, step: Step, before: (usize, usize)) -> Step {
        if before != self.position() {
            self.persist_position();
        }
        match step.item() {
            Some(item) if self.state.is_engaged() => {
                self.failures = 0;
                self.load(item);
            }
            Some(_) => {}
            None => self.halt(),
        }
        step
    }

    fn after_range_change(&mut self) {
        self.persist_position();
        if self.state.is_engaged() {
            match self.navigation.active() {
                Some(item) => {
                    self.failures = 0;
                    self.load(item);
                }
                None => self.halt(),
            }
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.navigation.page_index(), self.navigation.chapter_index())
    }

    fn persist_position(&self) {
        self.persist(PreferenceChange::Position {
            mode: self.navigation.mode(),
            page_index: self.navigation.page_index(),
            chapter_index: self.navigation.chapter_index(),
        });
    }

    fn persist(&self, change: PreferenceChange) {
        if let Err(e) = self.preferences.persist(change) {
            log::warn!("Failed to save preference {:?}: {}", change, e);
        }
    }
}

/// Resolves `item` and checks the file decodes
///
/// Downloaded or cached files that fail to decode are evicted so the next
/// attempt fetches them again.
async fn resolve_playable(
    resolver: &AudioResolver,
    item: ItemId,
    source: AudioSource,
) -> EngineResult<ResolvedAudio> {
    let resolved = resolver.resolve(item, source).await?;

    let path = resolved.path.clone();
    let probed = tokio::task::spawn_blocking(move || decoder::probe(&path))
        .await
        .map_err(|e| EngineError::OutputError(format!("probe task failed: {}", e)))?;

    match probed {
        Ok(info) => {
            log::debug!(
                "{}: {} Hz, {} channel(s), {:?}",
                resolved.path.display(),
                info.sample_rate,
                info.channels,
                info.duration
            );
            Ok(resolved)
        }
        Err(e) => {
            if matches!(
                resolved.provenance,
                Provenance::Cached | Provenance::DirectRemote | Provenance::ProviderRemapped
            ) {
                match resolver.evict(item, source).await {
                    Ok(true) => log::info!("Evicted undecodable {}", resolved.path.display()),
                    Ok(false) => {}
                    Err(evict) => log::warn!("Could not evict {}: {}", resolved.path.display(), evict),
                }
            }
            Err(e)
        }
    }
}
