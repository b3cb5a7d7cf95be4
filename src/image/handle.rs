//! Reference-counted handles over fetched image bytes.

use std::fmt;
use std::sync::Arc;

/// A locally-held, reference-counted handle to fetched image bytes.
///
/// Conceptually this is the object-URL of the original client, with the
/// revocation bug designed out: cloning is cheap, every clone refers to the
/// same bytes, and the bytes are released only when the *last* clone drops.
/// A binding dropping its clone can therefore never invalidate the copy the
/// cache (or any other consumer) still holds; the cache stays the sole
/// long-lived owner and [`ImageCache::evict`](super::ImageCache::evict) /
/// [`ImageCache::clear`](super::ImageCache::clear) are the only explicit
/// revocation points.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    url: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl ImageHandle {
    /// Wraps fetched bytes into a shareable handle.
    #[must_use]
    pub fn new(url: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                url: url.into(),
                content_type,
                bytes,
            }),
        }
    }

    /// The resolved URL these bytes were fetched from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Content type reported by the server, when present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type.as_deref()
    }

    /// The fetched image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Size of the fetched image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    /// Returns true when the fetched body was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    /// Returns true when both handles refer to the same underlying bytes.
    #[must_use]
    pub fn shares_bytes_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("url", &self.inner.url)
            .field("content_type", &self.inner.content_type)
            .field("len", &self.inner.bytes.len())
            .finish()
    }
}
