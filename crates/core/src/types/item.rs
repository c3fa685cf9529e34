//! Verse identifiers and corpus items

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier for a verse: chapter number and in-chapter sequence,
/// rendered as a fixed-width `CCCSSS` key (`078001`)
///
/// Ordering follows the rendered key, so sorting ids sorts the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    chapter: u16,
    sequence: u16,
}

impl ItemId {
    /// Largest value either half of the key can hold
    pub const MAX_COMPONENT: u16 = 999;

    /// Sequence number reserved for the chapter-opening formula
    pub const OPENING_SEQUENCE: u16 = 0;

    /// Builds an id from its chapter and sequence numbers
    pub fn new(chapter: u16, sequence: u16) -> Result<Self> {
        if chapter == 0 || chapter > Self::MAX_COMPONENT {
            return Err(AppError::InvalidItemId {
                value: format!("{}:{}", chapter, sequence),
                reason: format!("chapter must be between 1 and {}", Self::MAX_COMPONENT),
            });
        }
        if sequence > Self::MAX_COMPONENT {
            return Err(AppError::InvalidItemId {
                value: format!("{}:{}", chapter, sequence),
                reason: format!("sequence must be at most {}", Self::MAX_COMPONENT),
            });
        }
        Ok(Self { chapter, sequence })
    }

    /// The canonical opening-formula item (`001000`) that is played in place
    /// of every other chapter's opening formula
    pub fn opening_formula() -> Self {
        Self {
            chapter: 1,
            sequence: Self::OPENING_SEQUENCE,
        }
    }

    pub fn chapter(&self) -> u16 {
        self.chapter
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// True for an opening formula that should be replaced by
    /// [`ItemId::opening_formula`] before audio is looked up
    ///
    /// Chapter 1 is the one chapter whose opening formula is a verse in its
    /// own right, so it is never substituted.
    pub fn is_substituted_opening(&self) -> bool {
        self.sequence == Self::OPENING_SEQUENCE && self.chapter != 1
    }

    /// Returns the id whose audio should actually be played for this item
    pub fn audio_id(&self) -> Self {
        if self.is_substituted_opening() {
            Self::opening_formula()
        } else {
            *self
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}{:03}", self.chapter, self.sequence)
    }
}

impl FromStr for ItemId {
    type Err = AppError;

    /// Accepts the six-digit key (`078001`) or `chapter:sequence` (`78:1`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: &str| AppError::InvalidItemId {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (chapter, sequence) = if let Some((c, q)) = s.split_once(':') {
            (c, q)
        } else if s.len() == 6 && s.is_ascii() {
            s.split_at(3)
        } else {
            return Err(invalid("expected CCCSSS or chapter:sequence"));
        };

        let chapter = chapter
            .parse::<u16>()
            .map_err(|_| invalid("chapter is not a number"))?;
        let sequence = sequence
            .parse::<u16>()
            .map_err(|_| invalid("sequence is not a number"))?;
        Self::new(chapter, sequence)
    }
}

impl TryFrom<String> for ItemId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

/// Bounding box of one word on a rendered page
///
/// Only the rendering layer interprets these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub x: f32,
    pub y1: f32,
    pub y2: f32,
}

/// One verse of the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub page: u32,
    /// Layout metadata, one inner vector per rendered line
    pub lines: Vec<Vec<WordBox>>,
}

impl Item {
    pub fn new(id: ItemId, page: u32) -> Self {
        Self {
            id,
            page,
            lines: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<Vec<WordBox>>) -> Self {
        self.lines = lines;
        self
    }

    pub fn chapter(&self) -> u16 {
        self.id.chapter()
    }

    pub fn sequence(&self) -> u16 {
        self.id.sequence()
    }
}

/// Item as it appears in a corpus file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ItemRecord {
    pub page: u32,
    pub chapter: u16,
    pub sequence: u16,
    #[serde(default)]
    pub lines: Vec<Vec<WordBox>>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = AppError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let id = ItemId::new(record.chapter, record.sequence)?;
        Ok(Item::new(id, record.page).with_lines(record.lines))
    }
}
