// crates/network/src/download.rs
//! Streaming file downloads into the audio cache

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use futures::StreamExt;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Downloads remote files to local paths
#[derive(Debug, Clone)]
pub struct DownloadManager {
    client: Client,
}

impl DownloadManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Streams `url` into `destination`, replacing any file already there
    ///
    /// The body is written to a temporary file next to `destination` and
    /// renamed into place once complete, so a failed transfer never leaves a
    /// truncated file under the final name. Returns the number of bytes
    /// written.
    pub async fn download_file(&self, url: &str, destination: &Path) -> NetworkResult<u64> {
        let dir = destination.parent().ok_or_else(|| {
            NetworkError::DownloadFailed(format!("{} has no parent", destination.display()))
        })?;
        tokio::fs::create_dir_all(dir).await?;

        let response = self.client.get(url).await?;

        let (staged, staged_path) = NamedTempFile::new_in(dir)?.into_parts();
        let mut file = File::from_std(staged);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        drop(file);

        if written == 0 {
            return Err(NetworkError::DownloadFailed(format!("{} returned no data", url)));
        }

        staged_path
            .persist(destination)
            .map_err(|e| NetworkError::Io(e.error))?;

        log::debug!(
            "Downloaded {} bytes from {} to {}",
            written,
            url,
            destination.display()
        );
        Ok(written)
    }
}
