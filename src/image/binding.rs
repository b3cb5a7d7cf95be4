//! Binds a changing image reference to one visual element.
//!
//! [`ImageBinding`] is the adapter between a domain object's cover reference
//! and whatever actually displays it. The display side is abstracted behind
//! [`ImageSink`] so the binding stays UI-toolkit-free: a sink only needs to
//! accept a source and a loading flag.
//!
//! On every reference change the binding releases its previously owned
//! handle, enters a loading state, and then assigns exactly one of: the
//! reference itself (public URLs), a cached authenticated handle, or the
//! fallback placeholder. Updates are epoch-tokened so a slow fetch for a
//! superseded reference can never overwrite a newer assignment.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::cache::ImageCache;
use super::handle::ImageHandle;
use super::url::{NO_COVER_ASSET, needs_authentication};

/// The source a sink should display.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A public or pre-authorized URL, assignable as-is.
    Direct(String),
    /// Locally-held bytes from an authenticated fetch.
    Handle(ImageHandle),
    /// The placeholder asset; see [`ImageBinding::fallback`].
    Fallback(String),
}

/// Receiving end of a binding: one visual element.
///
/// `set_loading(true)` marks the transient state between a reference change
/// and the final assignment (the original client dimmed the element);
/// `set_source` always arrives before the matching `set_loading(false)`.
pub trait ImageSink: Send {
    /// Assigns the source the element should display.
    fn set_source(&mut self, source: ImageSource);
    /// Toggles the transient loading state.
    fn set_loading(&mut self, loading: bool);
}

/// Per-element state owned by the binding.
#[derive(Default)]
struct BindingState {
    /// The reference currently bound, for redundant-update suppression.
    current: Option<String>,
    /// The handle whose bytes the sink is displaying, when authenticated.
    /// Held so the bytes outlive cache eviction; dropped on every rebind.
    owned: Option<ImageHandle>,
    /// Incremented on every accepted update; stale completions compare
    /// against it and discard themselves.
    epoch: u64,
}

/// Drives one [`ImageSink`] from a changing image reference.
///
/// Dropping the binding releases its owned handle; because handles are
/// reference-counted this never invalidates the cache's copy or any other
/// binding displaying the same image.
pub struct ImageBinding<S: ImageSink> {
    cache: ImageCache,
    sink: Arc<Mutex<S>>,
    fallback: String,
    state: Mutex<BindingState>,
}

impl<S: ImageSink> ImageBinding<S> {
    /// Creates a binding with the default no-cover fallback asset.
    #[must_use]
    pub fn new(cache: ImageCache, sink: Arc<Mutex<S>>) -> Self {
        Self::with_fallback(cache, sink, NO_COVER_ASSET)
    }

    /// Creates a binding with a custom fallback asset reference.
    #[must_use]
    pub fn with_fallback(
        cache: ImageCache,
        sink: Arc<Mutex<S>>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            sink,
            fallback: fallback.into(),
            state: Mutex::new(BindingState::default()),
        }
    }

    /// The fallback asset assigned when resolution or fetching fails.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Reacts to a change of the bound reference.
    ///
    /// Setting the same reference again is a no-op. Otherwise the previous
    /// handle is released first (even when the new reference is empty or will
    /// fail), the sink enters its loading state, and the final source is
    /// assigned once known. Only the most recent update may assign; earlier
    /// updates still in flight discard their results when they complete.
    pub async fn update(&self, reference: Option<&str>) {
        let token = {
            let mut state = self.lock_state();
            if state.current.as_deref() == reference {
                return;
            }
            state.current = reference.map(ToOwned::to_owned);
            state.owned = None;
            state.epoch += 1;
            state.epoch
        };

        self.lock_sink().set_loading(true);

        let Some(reference) = reference.filter(|value| !value.trim().is_empty()) else {
            self.apply(token, ImageSource::Fallback(self.fallback.clone()), None);
            return;
        };

        if !needs_authentication(reference) {
            // Public or already-resolved; the sink can display it directly.
            self.apply(token, ImageSource::Direct(reference.to_string()), None);
            return;
        }

        match self.cache.load(reference).await {
            Some(handle) => {
                self.apply(token, ImageSource::Handle(handle.clone()), Some(handle));
            }
            None => self.apply(token, ImageSource::Fallback(self.fallback.clone()), None),
        }
    }

    /// Unbinds the element: releases the owned handle and resets the sink to
    /// the fallback. Dropping the binding also releases the handle, so this
    /// is only needed when the element outlives the binding's content.
    pub fn clear(&self) {
        {
            let mut state = self.lock_state();
            state.current = None;
            state.owned = None;
            state.epoch += 1;
        }
        let mut sink = self.lock_sink();
        sink.set_source(ImageSource::Fallback(self.fallback.clone()));
        sink.set_loading(false);
    }

    /// Applies a completed update unless a newer one has superseded it.
    fn apply(&self, token: u64, source: ImageSource, owned: Option<ImageHandle>) {
        {
            let mut state = self.lock_state();
            if state.epoch != token {
                debug!(token, epoch = state.epoch, "Discarding stale image result");
                return;
            }
            state.owned = owned;
        }
        let mut sink = self.lock_sink();
        sink.set_source(source);
        sink.set_loading(false);
    }

    fn lock_state(&self) -> MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sink(&self) -> MutexGuard<'_, S> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
