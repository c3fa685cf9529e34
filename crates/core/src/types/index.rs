//! Read-only corpus index
//!
//! Built once at startup from the corpus loader's ordered item list. All
//! lookups used by navigation (items per page, items per chapter, the
//! ordered page and chapter lists) are derived here and never change.

use crate::error::{AppError, Result};
use crate::types::item::ItemRecord;
use crate::types::{Item, ItemId, Range, RangeSelector};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Chapter name entry in a corpus file
#[derive(Debug, Clone, Deserialize)]
struct ChapterRecord {
    number: u16,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    chapters: Vec<ChapterRecord>,
    items: Vec<ItemRecord>,
}

/// Immutable lookup tables over the corpus
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    items: Vec<Item>,
    positions: HashMap<ItemId, usize>,
    by_page: BTreeMap<u32, Vec<ItemId>>,
    by_chapter: BTreeMap<u16, Vec<ItemId>>,
    pages: Vec<u32>,
    chapters: Vec<u16>,
    chapter_names: HashMap<u16, String>,
}

impl ContentIndex {
    /// Builds the index from items in corpus order
    ///
    /// A repeated id keeps its first occurrence.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut index = Self::default();

        for item in items {
            if index.positions.contains_key(&item.id) {
                continue;
            }
            index.positions.insert(item.id, index.items.len());
            index.by_page.entry(item.page).or_default().push(item.id);
            index.by_chapter.entry(item.chapter()).or_default().push(item.id);
            index.items.push(item);
        }

        index.pages = index.by_page.keys().copied().collect();
        index.chapters = index.by_chapter.keys().copied().collect();
        index
    }

    /// Attaches display names for chapters
    pub fn with_chapter_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        self.chapter_names
            .extend(names.into_iter().map(|(number, name)| (number, name.into())));
        self
    }

    /// Parses a corpus document: `{"chapters": [{number, name}], "items": [{page, chapter, sequence, lines}]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let corpus: CorpusFile = serde_json::from_str(json).map_err(|e| AppError::Corpus {
            reason: e.to_string(),
        })?;

        let items = corpus
            .items
            .into_iter()
            .map(Item::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(items).with_chapter_names(
            corpus
                .chapters
                .into_iter()
                .map(|chapter| (chapter.number, chapter.name)),
        ))
    }

    /// Reads and parses a corpus file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| AppError::Corpus {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.positions.get(&id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Items in corpus order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Sorted unique page numbers
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    /// Sorted unique chapter numbers
    pub fn chapters(&self) -> &[u16] {
        &self.chapters
    }

    pub fn items_on_page(&self, page: u32) -> &[ItemId] {
        self.by_page.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn items_in_chapter(&self, chapter: u16) -> &[ItemId] {
        self.by_chapter
            .get(&chapter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn page_of(&self, id: ItemId) -> Option<u32> {
        self.item(id).map(|item| item.page)
    }

    /// Page that holds the first item of a chapter
    pub fn opening_page(&self, chapter: u16) -> Option<u32> {
        self.items_in_chapter(chapter)
            .first()
            .and_then(|id| self.page_of(*id))
    }

    /// Display name of a chapter, falling back to its number
    pub fn chapter_name(&self, chapter: u16) -> String {
        self.chapter_names
            .get(&chapter)
            .cloned()
            .unwrap_or_else(|| chapter.to_string())
    }

    /// Materialises the items addressed by a selector
    pub fn range(&self, selector: RangeSelector) -> Range {
        let items = match selector {
            RangeSelector::Page(page) => self.items_on_page(page),
            RangeSelector::Chapter(chapter) => self.items_in_chapter(chapter),
        };
        Range::new(selector, items.to_vec())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
