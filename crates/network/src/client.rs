// crates/network/src/client.rs
//! HTTP client wrapper

use crate::error::{NetworkError, NetworkResult};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Settings applied to every request of a [`Client`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("verserec/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// One reqwest connection pool shared by lookups, downloads and uploads
///
/// There are no retries here. A failed download or upload stays pending and
/// the caller tries it again later.
#[derive(Debug, Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn inner(&self) -> &ReqwestClient {
        &self.inner
    }

    /// GET that treats any non-2xx answer as [`NetworkError::Status`]
    pub async fn get(&self, url: &str) -> NetworkResult<Response> {
        validate_url(url)?;
        let response = self.inner.get(url).send().await.map_err(map_send_error)?;
        check_status(response, url)
    }

    /// GETs `url` and decodes the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NetworkResult<T> {
        let response = self.get(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(format!("{}: {}", url, e)))
    }
}

pub(crate) fn validate_url(url: &str) -> NetworkResult<()> {
    match url.split_once("://") {
        Some(("http" | "https", rest)) if !rest.is_empty() => Ok(()),
        _ => Err(NetworkError::InvalidUrl(url.to_string())),
    }
}

pub(crate) fn map_send_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Http(err)
    }
}

pub(crate) fn check_status(response: Response, url: &str) -> NetworkResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        log::debug!("{} answered {}", url, status);
        Err(NetworkError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}
