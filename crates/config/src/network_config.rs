//! Network endpoints and HTTP behaviour

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

pub const DEFAULT_METADATA_BASE_URL: &str = "https://api.alquran.cloud/v1";
pub const DEFAULT_UPLOAD_ENDPOINT: &str =
    "https://quranapp-91342138aec0.herokuapp.com/recordings/upload";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Metadata provider used to remap verse numbers
    pub metadata_base_url: String,

    /// Recording upload endpoint
    pub upload_endpoint: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("verserec/{}", env!("CARGO_PKG_VERSION")),
            metadata_base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
        }
    }
}

impl ConfigSection for NetworkConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.timeout_secs, 1, 600, "network.timeout_secs"),
            Validator::not_empty(&self.user_agent, "network.user_agent"),
            Validator::http_url(&self.metadata_base_url, "network.metadata_base_url"),
            Validator::http_url(&self.upload_endpoint, "network.upload_endpoint"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.timeout_secs = other.timeout_secs;
        self.user_agent = other.user_agent;
        self.metadata_base_url = other.metadata_base_url;
        self.upload_endpoint = other.upload_endpoint;
    }

    fn section_name(&self) -> &'static str {
        "network"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(NetworkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_urls() {
        let config = NetworkConfig {
            upload_endpoint: "ftp://example.com".to_string(),
            metadata_base_url: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = NetworkConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
