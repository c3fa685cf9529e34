// crates/network/src/upload.rs
//! Multipart file uploads

use crate::client::{check_status, map_send_error, validate_url, Client};
use crate::error::{NetworkError, NetworkResult};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

/// One file posted as a single multipart field
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl MultipartUpload {
    pub fn new(
        url: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            field: "file".to_string(),
            file_name: file_name.into(),
            content_type: "application/octet-stream".to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl Client {
    /// POSTs the file and decodes the JSON answer
    pub async fn upload<T: DeserializeOwned>(&self, upload: MultipartUpload) -> NetworkResult<T> {
        validate_url(&upload.url)?;

        let size = upload.bytes.len();
        let part = Part::stream_with_length(upload.bytes, size as u64)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| NetworkError::InvalidRequest(format!("bad content type: {}", e)))?;
        let form = Form::new().part(upload.field.clone(), part);

        let response = self
            .inner()
            .post(&upload.url)
            .query(&upload.query)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response, &upload.url)?;

        log::debug!("Uploaded {} ({} bytes) to {}", upload.file_name, size, upload.url);

        response
            .json::<T>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let upload = MultipartUpload::new("https://example.com/upload", "a.m4a", vec![1, 2, 3])
            .with_field("audio_file")
            .with_content_type("audio/m4a")
            .with_query("recording_data", "{}");

        assert_eq!(upload.field, "audio_file");
        assert_eq!(upload.content_type, "audio/m4a");
        assert_eq!(upload.query, vec![("recording_data".to_string(), "{}".to_string())]);
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_url() {
        let client = Client::new().unwrap();
        let result = client
            .upload::<serde_json::Value>(MultipartUpload::new("ftp://x", "a.m4a", Vec::new()))
            .await;
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    }
}
