// FILE: crates/content-sources/src/fetcher.rs

use crate::traits::AudioFetcher;
use crate::SourceResult;
use async_trait::async_trait;
use std::path::Path;
use verserec_network::{Client, DownloadManager};

/// [`AudioFetcher`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    downloads: DownloadManager,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            downloads: DownloadManager::new(client),
        }
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> SourceResult<u64> {
        Ok(self.downloads.download_file(url, destination).await?)
    }
}
