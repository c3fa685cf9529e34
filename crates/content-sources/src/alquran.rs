// FILE: crates/content-sources/src/alquran.rs
//! alquran.cloud metadata provider
//!
//! `GET {base}/surah/{chapter}` answers with every verse of the chapter and
//! its global number, which is what the Hafs CDNs name their files after.

use crate::traits::{ChapterNumbering, MetadataProvider, ProviderVerse};
use crate::{SourceError, SourceResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use verserec_network::Client;

#[derive(Debug, Deserialize)]
struct SurahResponse {
    data: SurahData,
}

#[derive(Debug, Deserialize)]
struct SurahData {
    ayahs: Vec<Ayah>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ayah {
    number: u32,
    number_in_surah: u16,
}

/// Provider client with a per-chapter response cache
pub struct AlQuranCloudProvider {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<u16, ChapterNumbering>>,
}

impl AlQuranCloudProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn chapter_url(&self, chapter: u16) -> String {
        format!("{}/surah/{}", self.base_url, chapter)
    }

    fn cached(&self, chapter: u16) -> Option<ChapterNumbering> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&chapter).cloned())
    }
}

fn numbering_from(chapter: u16, response: SurahResponse) -> SourceResult<ChapterNumbering> {
    if response.data.ayahs.is_empty() {
        return Err(SourceError::Provider(format!(
            "chapter {} has no verses",
            chapter
        )));
    }
    Ok(ChapterNumbering {
        chapter,
        verses: response
            .data
            .ayahs
            .into_iter()
            .map(|ayah| ProviderVerse {
                number: ayah.number,
                number_in_chapter: ayah.number_in_surah,
            })
            .collect(),
    })
}

#[async_trait]
impl MetadataProvider for AlQuranCloudProvider {
    async fn chapter(&self, chapter: u16) -> SourceResult<ChapterNumbering> {
        if let Some(numbering) = self.cached(chapter) {
            return Ok(numbering);
        }

        let url = self.chapter_url(chapter);
        log::debug!("Fetching verse numbering from {}", url);
        let response: SurahResponse = self.client.get_json(&url).await?;
        let numbering = numbering_from(chapter, response)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(chapter, numbering.clone());
        }
        Ok(numbering)
    }
}
