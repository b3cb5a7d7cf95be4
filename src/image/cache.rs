//! In-memory cache of fetched cover art with in-flight request coalescing.
//!
//! # Overview
//!
//! [`ImageCache::load`] is the single entry point: it resolves a raw
//! reference against the current connection, serves a cached handle when one
//! exists, joins an in-flight fetch for the same resolved URL when one is
//! pending, and otherwise performs the fetch itself. Failures are absorbed:
//! callers only ever see `Some(handle)` or `None`, never an error, and a
//! failure is never cached, so the next request is free to retry.
//!
//! # Invariants
//!
//! - At most one network fetch is in flight per resolved URL; every
//!   concurrent caller for that URL awaits the same shared future.
//! - Only successful fetches are stored; the cache never holds a failure.
//! - The in-flight entry is removed when the fetch settles, success or not,
//!   so a past failure can never block later attempts.
//!
//! The maps are concurrent, so unlike the single-UI-thread original this
//! cache is safe to drive from a multi-threaded executor.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use crate::settings::ConnectionSource;

use super::fetcher::ImageFetcher;
use super::handle::ImageHandle;
use super::url::resolve_image_url;

/// A pending fetch shared by every concurrent caller of the same URL.
type SharedLoad = Shared<BoxFuture<'static, Option<ImageHandle>>>;

/// Session-wide cover-art cache keyed by resolved URL.
///
/// Cloning is cheap; all clones share the same cache and in-flight state.
/// The cache is the long-lived owner of every stored [`ImageHandle`];
/// consumers receive clones that stay valid even across [`evict`] or
/// [`clear`], because the underlying bytes are only released when the last
/// clone drops.
///
/// [`evict`]: ImageCache::evict
/// [`clear`]: ImageCache::clear
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    connection: Arc<dyn ConnectionSource>,
    fetcher: Arc<dyn ImageFetcher>,
    cache: DashMap<String, ImageHandle>,
    inflight: DashMap<String, SharedLoad>,
}

impl ImageCache {
    /// Creates a cache over an explicit connection source and fetcher.
    #[must_use]
    pub fn new(connection: Arc<dyn ConnectionSource>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                connection,
                fetcher,
                cache: DashMap::new(),
                inflight: DashMap::new(),
            }),
        }
    }

    /// Loads the image behind `reference`, from cache when possible.
    ///
    /// Returns `None` when the reference cannot be resolved (empty reference,
    /// unconfigured server, missing API key for a protected path) or when the
    /// fetch fails. Resolution failures never touch the network.
    pub async fn load(&self, reference: &str) -> Option<ImageHandle> {
        let Some(resolved) = resolve_image_url(reference, self.inner.connection.as_ref())
        else {
            debug!(reference, "Image reference did not resolve; no fetch attempted");
            return None;
        };
        let key = resolved.to_string();

        if let Some(cached) = self.inner.cache.get(&key) {
            debug!(url = %key, "Image cache hit");
            return Some(cached.clone());
        }

        self.join_or_start_fetch(&key).await
    }

    /// Joins the pending fetch for `key`, or starts one if none is in flight.
    fn join_or_start_fetch(&self, key: &str) -> SharedLoad {
        match self.inner.inflight.entry(key.to_string()) {
            Entry::Occupied(pending) => {
                debug!(url = %key, "Joining in-flight image fetch");
                pending.get().clone()
            }
            Entry::Vacant(slot) => {
                let task = fetch_and_settle(
                    Arc::clone(&self.inner.fetcher),
                    Arc::downgrade(&self.inner),
                    key.to_string(),
                )
                .boxed()
                .shared();
                slot.insert(task.clone());
                task
            }
        }
    }

    /// Drops the cached handle for `reference`, if any.
    ///
    /// Returns true when an entry was removed. Consumers holding clones of
    /// the evicted handle keep valid bytes until their clones drop.
    pub fn evict(&self, reference: &str) -> bool {
        resolve_image_url(reference, self.inner.connection.as_ref())
            .is_some_and(|resolved| self.inner.cache.remove(resolved.as_str()).is_some())
    }

    /// Drops every cached handle. In-flight fetches are unaffected.
    pub fn clear(&self) {
        self.inner.cache.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }
}

/// Performs the fetch for `url` and settles the shared bookkeeping exactly
/// once: store on success, never store a failure, always clear the in-flight
/// entry. Runs inside the shared future so every waiter observes a fully
/// settled cache by the time it resumes.
async fn fetch_and_settle(
    fetcher: Arc<dyn ImageFetcher>,
    inner: Weak<CacheInner>,
    url: String,
) -> Option<ImageHandle> {
    let result = match fetcher.fetch(&url).await {
        Ok(fetched) => Some(ImageHandle::new(
            url.clone(),
            fetched.content_type,
            fetched.bytes,
        )),
        Err(error) => {
            warn!(url = %url, error = %error, "Image fetch failed");
            None
        }
    };

    if let Some(inner) = inner.upgrade() {
        if let Some(handle) = &result {
            inner.cache.insert(url.clone(), handle.clone());
        }
        inner.inflight.remove(&url);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::image::error::FetchError;
    use crate::image::fetcher::FetchedImage;
    use crate::settings::ServerSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Mock fetcher with a call counter, optional gate to hold fetches open,
    /// and an optional scripted failure on the first call.
    struct ScriptedFetcher {
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
        fail_first: bool,
    }

    impl ScriptedFetcher {
        fn counting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                fail_first: false,
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::counting()
            }
        }

        fn failing_once() -> Self {
            Self {
                fail_first: true,
                ..Self::counting()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            if self.fail_first && call == 0 {
                return Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: 503,
                });
            }
            Ok(FetchedImage {
                bytes: vec![0xAB, 0xCD],
                content_type: Some("image/jpeg".to_string()),
            })
        }
    }

    fn configured() -> Arc<ServerSettings> {
        Arc::new(ServerSettings::new(
            Some("https://host:8787".to_string()),
            Some("XYZ".to_string()),
        ))
    }

    fn cache_with(fetcher: Arc<ScriptedFetcher>) -> ImageCache {
        ImageCache::new(configured(), fetcher)
    }

    #[tokio::test]
    async fn test_load_unconfigured_returns_none_without_fetching() {
        let fetcher = Arc::new(ScriptedFetcher::counting());
        let cache = ImageCache::new(Arc::new(ServerSettings::default()), fetcher.clone());

        let result = cache.load("MediaCover/Books/1/cover.jpg").await;

        assert!(result.is_none());
        assert_eq!(fetcher.calls(), 0, "unresolvable reference must not fetch");
        assert!(cache.is_empty(), "no entry may be created");
    }

    #[tokio::test]
    async fn test_load_caches_successful_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::counting());
        let cache = cache_with(fetcher.clone());

        let first = cache.load("MediaCover/a.jpg").await.unwrap();
        let second = cache.load("MediaCover/a.jpg").await.unwrap();

        assert_eq!(fetcher.calls(), 1, "second load must be a cache hit");
        assert!(first.shares_bytes_with(&second));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            first.url(),
            "https://host:8787/api/v1/MediaCover/a.jpg?apikey=XYZ"
        );
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce_into_one_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(ScriptedFetcher::gated(gate.clone()));
        let cache = cache_with(fetcher.clone());

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.load("MediaCover/a.jpg").await }
        });
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.load("MediaCover/a.jpg").await }
        });

        // Let both tasks reach the cache before the fetch is allowed to finish.
        tokio::task::yield_now().await;
        gate.add_permits(2);

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(fetcher.calls(), 1, "concurrent loads must share one fetch");
        assert!(second.shares_bytes_with(&first));
    }

    #[tokio::test]
    async fn test_distinct_references_fetch_independently() {
        let fetcher = Arc::new(ScriptedFetcher::counting());
        let cache = cache_with(fetcher.clone());

        cache.load("MediaCover/a.jpg").await.unwrap();
        cache.load("MediaCover/b.jpg").await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_retry_refetches() {
        let fetcher = Arc::new(ScriptedFetcher::failing_once());
        let cache = cache_with(fetcher.clone());

        let failed = cache.load("MediaCover/a.jpg").await;
        assert!(failed.is_none());
        assert!(cache.is_empty(), "failures must never be cached");

        let retried = cache.load("MediaCover/a.jpg").await;
        assert!(retried.is_some(), "retry must hit the network again");
        assert_eq!(fetcher.calls(), 2);

        // And the retried success is now served from cache.
        cache.load("MediaCover/a.jpg").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_evict_forces_refetch_but_keeps_old_handles_valid() {
        let fetcher = Arc::new(ScriptedFetcher::counting());
        let cache = cache_with(fetcher.clone());

        let original = cache.load("MediaCover/a.jpg").await.unwrap();
        assert!(cache.evict("MediaCover/a.jpg"));
        assert!(!cache.evict("MediaCover/a.jpg"), "second evict finds nothing");

        let refetched = cache.load("MediaCover/a.jpg").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert!(!original.shares_bytes_with(&refetched));
        assert_eq!(original.bytes(), &[0xAB, 0xCD], "evicted handle stays valid");
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let fetcher = Arc::new(ScriptedFetcher::counting());
        let cache = cache_with(fetcher.clone());

        cache.load("MediaCover/a.jpg").await.unwrap();
        cache.load("MediaCover/b.jpg").await.unwrap();
        cache.clear();

        assert!(cache.is_empty());
    }
}
