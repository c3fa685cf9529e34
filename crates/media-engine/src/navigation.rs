// FILE: crates/media-engine/src/navigation.rs
//! Page and chapter navigation over the corpus
//!
//! The current range is always recomputed from `(mode, page_index,
//! chapter_index)`. In chapter mode a page change also moves the chapter to
//! the one that opens on that page (or, failing that, the chapter of the
//! page's first item), and a chapter change moves the page to the chapter's
//! opening page. A guard flag keeps those two updates from feeding each
//! other.

use crate::error::{EngineError, EngineResult};
use std::sync::Arc;
use verserec_core::{ContentIndex, ItemId, NavigationMode, Range, RangeSelector};

/// Result of moving the active item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved inside the current range
    Moved(ItemId),
    /// Crossed into the neighbouring page or chapter
    EnteredRange(ItemId),
    /// Wrapped around to the other end
    Wrapped(ItemId),
    /// Stayed in the range, back at its first item
    Restarted(ItemId),
    /// Nothing left in that direction
    End,
}

impl Step {
    /// The newly active item, if any
    pub fn item(&self) -> Option<ItemId> {
        match *self {
            Step::Moved(item)
            | Step::EnteredRange(item)
            | Step::Wrapped(item)
            | Step::Restarted(item) => Some(item),
            Step::End => None,
        }
    }
}

/// Navigation position and the active item
#[derive(Debug, Clone)]
pub struct NavigationState {
    index: Arc<ContentIndex>,
    mode: NavigationMode,
    page_index: usize,
    chapter_index: usize,
    range: Range,
    active: Option<ItemId>,
    label: String,
    syncing: bool,
}

impl NavigationState {
    /// Starts at the first page
    pub fn new(index: Arc<ContentIndex>, mode: NavigationMode) -> Self {
        Self::with_position(index, mode, 0, 0)
    }

    /// Restores a saved position; indices past the end are clamped
    pub fn with_position(
        index: Arc<ContentIndex>,
        mode: NavigationMode,
        page_index: usize,
        chapter_index: usize,
    ) -> Self {
        let page_index = page_index.min(index.pages().len().saturating_sub(1));
        let chapter_index = chapter_index.min(index.chapters().len().saturating_sub(1));
        let mut state = Self {
            index,
            mode,
            page_index,
            chapter_index,
            range: Range::empty(RangeSelector::Page(0)),
            active: None,
            label: String::new(),
            syncing: false,
        };
        state.recompute();
        state
    }

    pub fn index(&self) -> &Arc<ContentIndex> {
        &self.index
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    /// Page number at the current page index
    pub fn page(&self) -> Option<u32> {
        self.index.pages().get(self.page_index).copied()
    }

    /// Chapter number at the current chapter index
    pub fn chapter(&self) -> Option<u16> {
        self.index.chapters().get(self.chapter_index).copied()
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn active(&self) -> Option<ItemId> {
        self.active
    }

    /// "Now playing" text for the current range
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Switches between page and chapter addressing
    ///
    /// Entering chapter mode picks the chapter for the current page; entering
    /// page mode picks the page of the active item.
    pub fn set_mode(&mut self, mode: NavigationMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            NavigationMode::ByChapter => {
                if let Some(chapter) = self.page().and_then(|page| self.chapter_for_page(page)) {
                    self.chapter_index = self.chapter_position(chapter);
                }
            }
            NavigationMode::ByPage => {
                let page = self
                    .active
                    .and_then(|item| self.index.page_of(item))
                    .or_else(|| self.chapter().and_then(|c| self.index.opening_page(c)));
                if let Some(page) = page {
                    self.page_index = self.page_position(page);
                }
            }
        }
        self.recompute();
    }

    /// Moves to the page at `page_index` in the ordered page list
    pub fn set_page_index(&mut self, page_index: usize) {
        self.page_index = page_index.min(self.index.pages().len().saturating_sub(1));
        if self.mode == NavigationMode::ByChapter && !self.syncing {
            self.syncing = true;
            if let Some(chapter) = self.page().and_then(|page| self.chapter_for_page(page)) {
                let chapter_index = self.chapter_position(chapter);
                self.set_chapter_index(chapter_index);
            }
            self.syncing = false;
        }
        self.recompute();
    }

    /// Moves to the chapter at `chapter_index` in the ordered chapter list
    pub fn set_chapter_index(&mut self, chapter_index: usize) {
        self.chapter_index = chapter_index.min(self.index.chapters().len().saturating_sub(1));
        if self.mode == NavigationMode::ByChapter && !self.syncing {
            self.syncing = true;
            if let Some(page) = self.chapter().and_then(|c| self.index.opening_page(c)) {
                let page_index = self.page_position(page);
                self.set_page_index(page_index);
            }
            self.syncing = false;
        }
        self.recompute();
    }

    /// Selects the range addressed by `selector`, switching mode to match
    ///
    /// The active item resets to the range's first item.
    pub fn set_range(&mut self, selector: RangeSelector) -> EngineResult<()> {
        match selector {
            RangeSelector::Page(page) => {
                let position = self
                    .index
                    .pages()
                    .iter()
                    .position(|p| *p == page)
                    .ok_or(EngineError::UnknownRange(selector))?;
                self.set_mode(NavigationMode::ByPage);
                self.set_page_index(position);
            }
            RangeSelector::Chapter(chapter) => {
                let position = self
                    .index
                    .chapters()
                    .iter()
                    .position(|c| *c == chapter)
                    .ok_or(EngineError::UnknownRange(selector))?;
                self.mode = NavigationMode::ByChapter;
                self.set_chapter_index(position);
            }
        }
        Ok(())
    }

    /// Makes `item` active if it belongs to the current range
    pub fn set_active(&mut self, item: ItemId) -> bool {
        if self.range.contains(item) {
            self.active = Some(item);
            true
        } else {
            false
        }
    }

    /// Resets the active item to the start of the range
    pub fn restart(&mut self) -> Option<ItemId> {
        self.active = self.range.first();
        self.active
    }

    /// Clears the active item; playback has stopped
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Next item inside the current range only
    pub fn next_in_range(&mut self) -> Option<ItemId> {
        let position = self.active_position()?;
        let next = self.range.get(position + 1)?;
        self.active = Some(next);
        Some(next)
    }

    /// Moves to the next page or chapter and activates its first item
    pub fn next_range(&mut self) -> Option<ItemId> {
        match self.mode {
            NavigationMode::ByPage => {
                if self.page_index + 1 >= self.index.pages().len() {
                    return None;
                }
                self.set_page_index(self.page_index + 1);
            }
            NavigationMode::ByChapter => {
                if self.chapter_index + 1 >= self.index.chapters().len() {
                    return None;
                }
                self.set_chapter_index(self.chapter_index + 1);
            }
        }
        self.active
    }

    /// One step forward
    ///
    /// At the end of the range this restarts it when `repeat` is set,
    /// otherwise crosses into the next page or chapter. Returns
    /// [`Step::End`] at the end of the corpus or when the range is empty.
    pub fn advance(&mut self, repeat: bool) -> Step {
        if self.range.is_empty() {
            return Step::End;
        }
        if self.active.is_none() {
            return self.restart().map(Step::Moved).unwrap_or(Step::End);
        }
        if let Some(next) = self.next_in_range() {
            return Step::Moved(next);
        }
        if repeat {
            return self.restart().map(Step::Wrapped).unwrap_or(Step::End);
        }
        self.next_range().map(Step::EnteredRange).unwrap_or(Step::End)
    }

    /// One step back
    ///
    /// From the first item of a range this goes to the last item of the
    /// previous range. At the very first chapter it wraps to the last item of
    /// the last chapter; at the very first page it restarts that page.
    pub fn retreat(&mut self) -> Step {
        if self.range.is_empty() {
            return Step::End;
        }
        let position = match self.active_position() {
            Some(position) => position,
            None => return self.restart().map(Step::Restarted).unwrap_or(Step::End),
        };
        if position > 0 {
            let previous = self.range.get(position - 1);
            self.active = previous;
            return previous.map(Step::Moved).unwrap_or(Step::End);
        }

        match self.mode {
            NavigationMode::ByPage => {
                if self.page_index == 0 {
                    return self.restart().map(Step::Restarted).unwrap_or(Step::End);
                }
                self.set_page_index(self.page_index - 1);
                self.activate_last().map(Step::EnteredRange).unwrap_or(Step::End)
            }
            NavigationMode::ByChapter => {
                let wrapped = self.chapter_index == 0;
                let target = if wrapped {
                    self.index.chapters().len().saturating_sub(1)
                } else {
                    self.chapter_index - 1
                };
                self.set_chapter_index(target);
                match self.activate_last() {
                    Some(item) if wrapped => Step::Wrapped(item),
                    Some(item) => Step::EnteredRange(item),
                    None => Step::End,
                }
            }
        }
    }

    fn activate_last(&mut self) -> Option<ItemId> {
        self.active = self.range.last();
        self.active
    }

    fn active_position(&self) -> Option<usize> {
        self.active.and_then(|item| self.range.position(item))
    }

    /// Chapter whose opening item is on `page`, else the chapter of the
    /// page's first item
    fn chapter_for_page(&self, page: u32) -> Option<u16> {
        let items = self.index.items_on_page(page);
        items
            .iter()
            .find(|item| self.index.items_in_chapter(item.chapter()).first() == Some(*item))
            .or_else(|| items.first())
            .map(|item| item.chapter())
    }

    fn chapter_position(&self, chapter: u16) -> usize {
        self.index
            .chapters()
            .iter()
            .position(|c| *c == chapter)
            .unwrap_or(self.chapter_index)
    }

    fn page_position(&self, page: u32) -> usize {
        self.index
            .pages()
            .iter()
            .position(|p| *p == page)
            .unwrap_or(self.page_index)
    }

    fn selector(&self) -> RangeSelector {
        match self.mode {
            NavigationMode::ByPage => RangeSelector::Page(self.page().unwrap_or(0)),
            NavigationMode::ByChapter => RangeSelector::Chapter(self.chapter().unwrap_or(0)),
        }
    }

    fn recompute(&mut self) {
        self.range = self.index.range(self.selector());
        self.active = self.range.first();
        self.label = self.describe();
    }

    fn describe(&self) -> String {
        let (Some(first), Some(last)) = (self.range.first(), self.range.last()) else {
            return String::new();
        };
        let first_name = self.index.chapter_name(first.chapter());
        if first.chapter() == last.chapter() {
            format!("{} {} : {}", first_name, first.sequence(), last.sequence())
        } else {
            format!(
                "{} {} : {} {}",
                first_name,
                first.sequence(),
                self.index.chapter_name(last.chapter()),
                last.sequence()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verserec_core::Item;

    fn id(chapter: u16, sequence: u16) -> ItemId {
        ItemId::new(chapter, sequence).unwrap()
    }

    /// Page 1: chapter 1. Page 2: chapter 77 opens. Page 3: end of 77 and
    /// the opening of 78. Page 4: the rest of 78.
    fn index() -> Arc<ContentIndex> {
        let mut items = Vec::new();
        for s in 1..=7 {
            items.push(Item::new(id(1, s), 1));
        }
        for s in 40..=47 {
            items.push(Item::new(id(77, s), 2));
        }
        for s in 48..=50 {
            items.push(Item::new(id(77, s), 3));
        }
        for s in 0..=5 {
            items.push(Item::new(id(78, s), 3));
        }
        for s in 6..=40 {
            items.push(Item::new(id(78, s), 4));
        }
        Arc::new(
            ContentIndex::new(items).with_chapter_names([(1, "Al-Fatiha"), (78, "An-Naba")]),
        )
    }

    #[test]
    fn test_initial_range_is_first_page() {
        let nav = NavigationState::new(index(), NavigationMode::ByPage);
        assert_eq!(nav.range().len(), 7);
        assert_eq!(nav.active(), Some(id(1, 1)));
        assert_eq!(nav.label(), "Al-Fatiha 1 : 7");
    }

    #[test]
    fn test_label_spanning_chapters() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        nav.set_range(RangeSelector::Page(3)).unwrap();
        assert_eq!(nav.label(), "77 48 : An-Naba 5");
    }

    #[test]
    fn test_page_change_in_chapter_mode_prefers_opening_chapter() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByChapter);
        nav.set_page_index(1);
        assert_eq!(nav.chapter(), Some(77));

        nav.set_page_index(2);
        assert_eq!(nav.chapter(), Some(78));
        assert_eq!(nav.page(), Some(3));
        assert_eq!(nav.range().first(), Some(id(78, 0)));

        // No chapter opens on page 4, so its first item decides
        nav.set_page_index(3);
        assert_eq!(nav.chapter(), Some(78));
        assert_eq!(nav.page(), Some(4));
    }

    #[test]
    fn test_chapter_change_moves_page() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByChapter);
        nav.set_chapter_index(2);
        assert_eq!(nav.chapter(), Some(78));
        assert_eq!(nav.page(), Some(3));
        assert_eq!(nav.range().len(), 41);
    }

    #[test]
    fn test_unknown_range() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        assert!(matches!(
            nav.set_range(RangeSelector::Chapter(2)),
            Err(EngineError::UnknownRange(_))
        ));
        assert_eq!(nav.active(), Some(id(1, 1)));
    }

    #[test]
    fn test_advance_crosses_pages_and_stops_at_end() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        nav.set_range(RangeSelector::Page(4)).unwrap();
        assert!(nav.set_active(id(78, 40)));
        assert_eq!(nav.advance(false), Step::End);

        nav.set_range(RangeSelector::Page(1)).unwrap();
        assert!(nav.set_active(id(1, 7)));
        assert!(!nav.set_active(id(78, 1)));
        assert_eq!(nav.advance(false), Step::EnteredRange(id(77, 40)));
        assert_eq!(nav.page(), Some(2));
    }

    #[test]
    fn test_advance_with_repeat_wraps() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        nav.set_active(id(1, 7));
        assert_eq!(nav.advance(true), Step::Wrapped(id(1, 1)));
        assert_eq!(nav.page(), Some(1));
    }

    #[test]
    fn test_retreat_in_page_mode() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        assert_eq!(nav.retreat(), Step::Restarted(id(1, 1)));

        nav.set_range(RangeSelector::Page(2)).unwrap();
        assert_eq!(nav.retreat(), Step::EnteredRange(id(1, 7)));
        assert_eq!(nav.retreat(), Step::Moved(id(1, 6)));
    }

    #[test]
    fn test_retreat_in_chapter_mode_wraps_to_last_chapter() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByChapter);
        assert_eq!(nav.chapter(), Some(1));
        assert_eq!(nav.retreat(), Step::Wrapped(id(78, 40)));
        assert_eq!(nav.chapter(), Some(78));
        assert_eq!(nav.retreat(), Step::Moved(id(78, 39)));
    }

    #[test]
    fn test_mode_switch_keeps_place() {
        let mut nav = NavigationState::new(index(), NavigationMode::ByPage);
        nav.set_range(RangeSelector::Page(4)).unwrap();
        nav.set_mode(NavigationMode::ByChapter);
        assert_eq!(nav.chapter(), Some(78));

        nav.set_mode(NavigationMode::ByPage);
        assert_eq!(nav.page(), Some(3));
    }

    #[test]
    fn test_empty_corpus() {
        let mut nav = NavigationState::new(Arc::new(ContentIndex::default()), NavigationMode::ByPage);
        assert!(nav.range().is_empty());
        assert_eq!(nav.active(), None);
        assert_eq!(nav.label(), "");
        assert_eq!(nav.advance(false), Step::End);
        assert_eq!(nav.retreat(), Step::End);
        assert_eq!(nav.active(), None);
    }

    #[test]
    fn test_with_position_clamps() {
        let nav = NavigationState::with_position(index(), NavigationMode::ByPage, 99, 99);
        assert_eq!(nav.page(), Some(4));
        assert_eq!(nav.chapter(), Some(78));
    }
}
