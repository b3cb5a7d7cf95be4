//! Error types for authenticated image fetches.
//!
//! These errors never escape the image cache: `load` absorbs them into a
//! `None` result after logging. They exist so the fetcher seam has a
//! structured contract and so logs carry the failing URL and status.

use thiserror::Error;

/// Errors that can occur while fetching image bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, timeout).
    #[error("network error fetching image {url}: {source}")]
    Network {
        /// The URL that failed to fetch.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx/5xx). A 401 is an ordinary failure here:
    /// the image layer applies no special retry or backoff for it.
    #[error("HTTP {status} fetching image {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL could not be parsed for the request.
    #[error("invalid image URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}
