//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use verserec_core::{AudioSource, NavigationMode, PlaybackRate};

/// Playback preferences and the last navigation position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback rate (1.0, 1.25, 1.5, 1.75 or 2.0)
    pub rate: PlaybackRate,

    /// Restart the range when its last item finishes
    pub repeat_range: bool,

    /// Whether the navigator addresses pages or chapters
    pub navigation_mode: NavigationMode,

    /// Preferred reference audio
    pub audio_source: AudioSource,

    /// Index into the ordered page list
    pub page_index: usize,

    /// Index into the ordered chapter list
    pub chapter_index: usize,

    /// In chapter mode, keep playing into the next chapter when one ends
    pub follow_chapters: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            rate: PlaybackRate::NORMAL,
            repeat_range: false,
            navigation_mode: NavigationMode::ByPage,
            audio_source: AudioSource::HusaryQaloon,
            page_index: 0,
            chapter_index: 0,
            follow_chapters: false,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        // Upper bounds depend on the loaded corpus; navigation clamps them.
        Validator::collect_errors(vec![
            Validator::in_range(self.page_index, 0, 9_999, "player.page_index"),
            Validator::in_range(self.chapter_index, 0, 999, "player.chapter_index"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.rate = other.rate;
        self.repeat_range = other.repeat_range;
        self.navigation_mode = other.navigation_mode;
        self.audio_source = other.audio_source;
        self.page_index = other.page_index;
        self.chapter_index = other.chapter_index;
        self.follow_chapters = other.follow_chapters;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
