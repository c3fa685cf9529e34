//! Playback rate

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed playback multipliers the player cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct PlaybackRate {
    step: usize,
}

impl PlaybackRate {
    /// Supported multipliers in cycle order
    pub const CYCLE: [f32; 5] = [1.0, 1.25, 1.5, 1.75, 2.0];

    pub const NORMAL: PlaybackRate = PlaybackRate { step: 0 };

    /// Looks up a supported multiplier
    pub fn new(value: f32) -> Result<Self, AppError> {
        Self::CYCLE
            .iter()
            .position(|rate| (rate - value).abs() < f32::EPSILON)
            .map(|step| Self { step })
            .ok_or_else(|| AppError::Config {
                message: format!(
                    "unsupported playback rate {}, expected one of {:?}",
                    value,
                    Self::CYCLE
                ),
            })
    }

    /// Like [`PlaybackRate::new`] but any unsupported value becomes 1.0
    pub fn from_multiplier(value: f32) -> Self {
        Self::new(value).unwrap_or(Self::NORMAL)
    }

    pub fn value(&self) -> f32 {
        Self::CYCLE[self.step]
    }

    /// Next multiplier in the cycle, wrapping from 2.0 back to 1.0
    pub fn next(&self) -> Self {
        Self {
            step: (self.step + 1) % Self::CYCLE.len(),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.step == 0
    }
}

impl TryFrom<f32> for PlaybackRate {
    type Error = AppError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlaybackRate> for f32 {
    fn from(rate: PlaybackRate) -> Self {
        rate.value()
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x", self.value())
    }
}
