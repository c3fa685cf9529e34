//! Persist-on-change player preferences
//!
//! The playback controller reports every preference it changes through a
//! [`PreferenceStore`]; nothing reads or writes ambient global storage.

use crate::manager::ConfigManager;
use crate::{ConfigError, ConfigResult, PlayerConfig};
use std::sync::Mutex;
use verserec_core::{AudioSource, NavigationMode, PlaybackRate};

/// A single preference change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceChange {
    Rate(PlaybackRate),
    Repeat(bool),
    Source(AudioSource),
    Position {
        mode: NavigationMode,
        page_index: usize,
        chapter_index: usize,
    },
}

impl PreferenceChange {
    pub fn apply(&self, player: &mut PlayerConfig) {
        match *self {
            Self::Rate(rate) => player.rate = rate,
            Self::Repeat(repeat) => player.repeat_range = repeat,
            Self::Source(source) => player.audio_source = source,
            Self::Position {
                mode,
                page_index,
                chapter_index,
            } => {
                player.navigation_mode = mode;
                player.page_index = page_index;
                player.chapter_index = chapter_index;
            }
        }
    }
}

/// Sink for preference changes
pub trait PreferenceStore: Send + Sync {
    fn persist(&self, change: PreferenceChange) -> ConfigResult<()>;
}

impl PreferenceStore for ConfigManager {
    fn persist(&self, change: PreferenceChange) -> ConfigResult<()> {
        self.update(|config| change.apply(&mut config.player))
    }
}

/// In-memory store; keeps the current values and the change history
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    state: Mutex<(PlayerConfig, Vec<PreferenceChange>)>,
}

impl MemoryPreferences {
    pub fn new(player: PlayerConfig) -> Self {
        Self {
            state: Mutex::new((player, Vec::new())),
        }
    }

    pub fn player(&self) -> PlayerConfig {
        self.state
            .lock()
            .map(|state| state.0.clone())
            .unwrap_or_default()
    }

    pub fn changes(&self) -> Vec<PreferenceChange> {
        self.state
            .lock()
            .map(|state| state.1.clone())
            .unwrap_or_default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn persist(&self, change: PreferenceChange) -> ConfigResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ConfigError::Unavailable("Lock poisoned".to_string()))?;
        change.apply(&mut state.0);
        state.1.push(change);
        Ok(())
    }
}
