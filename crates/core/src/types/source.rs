//! Reference audio sources

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How a source's remote file name is derived from an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `{base}/{itemId}.mp3`
    Direct,
    /// `{base}/{providerNumber}.mp3`, numbering looked up per chapter
    ProviderRemapped,
    /// Never fetched; only files already on disk
    LocalOnly,
}

/// Named provenance for reference audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// Husary, Qaloon transmission
    #[default]
    HusaryQaloon,
    /// Alafasy, Hafs transmission
    AlafasyHafs,
    /// Husary, Hafs transmission
    HusaryHafs,
    /// Abdul Basit (murattal), Hafs transmission
    AbdulbasitHafs,
    /// The user's own takes from one range recording
    UserRecording(Uuid),
}

impl AudioSource {
    /// Reference reciters that can be fetched from the network
    pub const REMOTE: [AudioSource; 4] = [
        AudioSource::HusaryQaloon,
        AudioSource::AlafasyHafs,
        AudioSource::HusaryHafs,
        AudioSource::AbdulbasitHafs,
    ];

    /// Stable key used in cache file names
    pub fn key(&self) -> &'static str {
        match self {
            Self::HusaryQaloon => "husaryQaloon",
            Self::AlafasyHafs => "alafasyHafs",
            Self::HusaryHafs => "husaryHafs",
            Self::AbdulbasitHafs => "abdulbasitHafs",
            Self::UserRecording(_) => "userRecording",
        }
    }

    pub fn base_url(&self) -> Option<&'static str> {
        match self {
            Self::HusaryQaloon => Some("https://nurlingo.github.io/qaloon/ar.husary"),
            Self::AlafasyHafs => Some("https://cdn.islamic.network/quran/audio/64/ar.alafasy"),
            Self::HusaryHafs => Some("https://cdn.islamic.network/quran/audio/64/ar.husary"),
            Self::AbdulbasitHafs => {
                Some("https://cdn.islamic.network/quran/audio/64/ar.abdulbasitmurattal")
            }
            Self::UserRecording(_) => None,
        }
    }

    pub fn addressing(&self) -> Addressing {
        match self {
            Self::HusaryQaloon => Addressing::Direct,
            Self::AlafasyHafs | Self::HusaryHafs | Self::AbdulbasitHafs => {
                Addressing::ProviderRemapped
            }
            Self::UserRecording(_) => Addressing::LocalOnly,
        }
    }

    pub fn is_user_recording(&self) -> bool {
        matches!(self, Self::UserRecording(_))
    }

    /// File extension of this source's audio
    pub fn extension(&self) -> &'static str {
        match self {
            Self::UserRecording(_) => "m4a",
            _ => "mp3",
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRecording(id) => write!(f, "userRecording:{}", id),
            other => write!(f, "{}", other.key()),
        }
    }
}

impl FromStr for AudioSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("userRecording:") {
            let id = Uuid::parse_str(id).map_err(|e| AppError::NotFound {
                entity: "recording".to_string(),
                identifier: format!("{} ({})", id, e),
            })?;
            return Ok(Self::UserRecording(id));
        }

        Self::REMOTE
            .into_iter()
            .find(|source| source.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::NotFound {
                entity: "audio source".to_string(),
                identifier: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressing() {
        assert_eq!(AudioSource::HusaryQaloon.addressing(), Addressing::Direct);
        assert_eq!(
            AudioSource::AlafasyHafs.addressing(),
            Addressing::ProviderRemapped
        );
        assert_eq!(
            AudioSource::UserRecording(Uuid::new_v4()).addressing(),
            Addressing::LocalOnly
        );
    }

    #[test]
    fn test_remote_sources_have_base_urls() {
        for source in AudioSource::REMOTE {
            assert!(source.base_url().is_some(), "{} has no base url", source);
        }
        assert!(AudioSource::UserRecording(Uuid::new_v4())
            .base_url()
            .is_none());
    }

    #[test]
    fn test_parse_round_trip() {
        for source in AudioSource::REMOTE {
            let parsed: AudioSource = source.to_string().parse().unwrap();
            assert_eq!(parsed, source);
        }
        let own = AudioSource::UserRecording(Uuid::new_v4());
        assert_eq!(own.to_string().parse::<AudioSource>().unwrap(), own);
        assert!("nobody".parse::<AudioSource>().is_err());
    }
}
