//! Ranges of items selected for navigation and playback

use crate::types::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the navigator addresses the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    ByPage,
    ByChapter,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByPage => write!(f, "by page"),
            Self::ByChapter => write!(f, "by chapter"),
        }
    }
}

/// Addresses a range as every item on a page or every item in a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSelector {
    Page(u32),
    Chapter(u16),
}

impl RangeSelector {
    pub fn mode(&self) -> NavigationMode {
        match self {
            Self::Page(_) => NavigationMode::ByPage,
            Self::Chapter(_) => NavigationMode::ByChapter,
        }
    }
}

impl fmt::Display for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page {}", page),
            Self::Chapter(chapter) => write!(f, "chapter {}", chapter),
        }
    }
}

/// Contiguous ordered run of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    selector: RangeSelector,
    items: Vec<ItemId>,
}

impl Range {
    pub fn new(selector: RangeSelector, items: Vec<ItemId>) -> Self {
        Self { selector, items }
    }

    pub fn empty(selector: RangeSelector) -> Self {
        Self::new(selector, Vec::new())
    }

    pub fn selector(&self) -> RangeSelector {
        self.selector
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn first(&self) -> Option<ItemId> {
        self.items.first().copied()
    }

    pub fn last(&self) -> Option<ItemId> {
        self.items.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| *item == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
