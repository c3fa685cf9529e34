// crates/network/src/lib.rs
//! HTTP plumbing for verserec: JSON lookups, cache downloads and multipart
//! recording uploads

mod client;
mod download;
mod error;
mod upload;

pub use client::{Client, ClientConfig};
pub use download::DownloadManager;
pub use error::{NetworkError, NetworkResult};
pub use upload::MultipartUpload;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let client = Client::new().expect("Failed to create client");
        let _: DownloadManager = DownloadManager::new(client);
        let _: MultipartUpload = MultipartUpload::new("https://example.com", "a.m4a", Vec::new());
    }
}
