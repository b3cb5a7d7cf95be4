//! Authenticated cover-art pipeline: resolution, fetching, caching, binding.
//!
//! # Architecture
//!
//! - [`resolve_image_url`] / [`needs_authentication`] - pure URL resolution
//! - [`ImageHandle`] - reference-counted handle over fetched bytes
//! - [`ImageFetcher`] / [`HttpImageFetcher`] - the binary-fetch seam
//! - [`ImageCache`] - session cache with in-flight request coalescing
//! - [`ImageBinding`] / [`ImageSink`] - drives one visual element from a
//!   changing reference, with stale-result protection and fallback
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use covercache::image::{HttpImageFetcher, ImageCache};
//! use covercache::settings::ServerSettings;
//!
//! # async fn example() {
//! let settings = Arc::new(ServerSettings::new(
//!     Some("https://host:8787".to_string()),
//!     Some("XYZ".to_string()),
//! ));
//! let cache = ImageCache::new(settings, Arc::new(HttpImageFetcher::new()));
//!
//! if let Some(cover) = cache.load("MediaCover/Books/42/cover.jpg").await {
//!     println!("{} bytes of cover art", cover.len());
//! }
//! # }
//! ```

mod binding;
mod cache;
mod error;
mod fetcher;
mod handle;
mod url;

pub use binding::{ImageBinding, ImageSink, ImageSource};
pub use cache::ImageCache;
pub use error::FetchError;
pub use fetcher::{FetchedImage, HttpImageFetcher, ImageFetcher};
pub use handle::ImageHandle;
pub use url::{NO_COVER_ASSET, PROTECTED_PREFIX, is_absolute, needs_authentication, resolve_image_url};
