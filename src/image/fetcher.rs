//! Binary fetch seam for image bytes.
//!
//! [`ImageFetcher`] is the outbound collaborator of the image cache: given a
//! resolved URL it returns raw bytes. It is an object-safe async trait so the
//! cache and binding can be driven by a mock in tests without a network.
//!
//! The production implementation, [`HttpImageFetcher`], deliberately sends
//! **no custom request headers**. Protected covers carry their API key as an
//! `apikey` query parameter; keeping the request header-free means image
//! fetches stay CORS simple requests and never trigger a preflight.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::error::FetchError;

/// Connect timeout for image requests.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Read timeout for image requests. Covers are small; anything slower than
/// this is treated as a failure and falls back to the placeholder.
const READ_TIMEOUT_SECS: u64 = 30;

/// Successfully fetched image content.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Content type reported by the server, when present.
    pub content_type: Option<String>,
}

/// Fetches binary image content for a resolved URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, non-success status, or an
    /// unparseable URL.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// HTTP implementation of [`ImageFetcher`] backed by a pooled reqwest client.
///
/// Designed to be created once and shared; connection pooling makes repeated
/// cover fetches against the same server cheap.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpImageFetcher {
    /// Creates a fetcher with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(concat!("covercache/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Creates a fetcher around an existing client, sharing its pool.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        // Validate URL
        let parsed_url = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        // No .header() calls here: the API key is already in the query
        // string and extra headers would force a preflighted request.
        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        debug!(url, bytes = bytes.len(), "Image fetched");
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_rejects_unparseable_url_without_network() {
        let fetcher = HttpImageFetcher::new();
        let result = tokio_test::block_on(fetcher.fetch("not-a-valid-url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_fetch_rejects_empty_url() {
        let fetcher = HttpImageFetcher::new();
        let result = tokio_test::block_on(fetcher.fetch(""));
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
