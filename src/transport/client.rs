//! reqwest-backed [`Transport`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchError, Transport};
use crate::user_agent;

/// Timeout configuration for [`HttpClient`].
///
/// Both values are optional. When unset, no timeout is applied and a hung
/// request blocks its worker until the remote side gives up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportSettings {
    /// Maximum time to establish a connection.
    pub connect_timeout: Option<Duration>,
    /// Maximum time for a whole request, body included.
    pub request_timeout: Option<Duration>,
}

/// HTTP client with a persistent connection pool.
///
/// Create one per worker and reuse it for every request the worker makes.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the given timeout settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built
    /// (for example when the TLS backend fails to initialize).
    pub fn new(settings: &TransportSettings) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(user_agent::default_user_agent())
            .gzip(true);
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;
        debug!(bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}
