//! Server connection settings: model, validation, persistence and the
//! read-mostly live view consumed by the image subsystem.
//!
//! The connection to the library server is two opaque values: a base URL
//! and an API key. Both must be present (and the URL well-formed) before
//! any protected fetch is attempted; everything downstream short-circuits
//! to "no image" otherwise.
//!
//! # Architecture
//!
//! - [`ServerSettings`] - the persisted model with validation
//! - [`SettingsStore`] - JSON-file load/save/reset plus first-run detection
//! - [`SettingsHandle`] - shared live view, mutated only by an explicit save
//! - [`ConnectionSource`] - the synchronous getter seam the resolver and
//!   cache consume, so the core stays testable without a settings file

mod error;
mod store;

pub use error::SettingsError;
pub use store::SettingsStore;

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use url::Url;

/// Persisted server connection settings.
///
/// Field names serialize in camelCase to stay compatible with the shape the
/// mobile client historically persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Absolute base URL of the library server, e.g. `https://host:8787`.
    pub url: Option<String>,
    /// Opaque API key issued by the server.
    pub api_key: Option<String>,
}

impl ServerSettings {
    /// Creates settings from explicit values, treating empty strings as unset.
    #[must_use]
    pub fn new(url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.filter(|value| !value.trim().is_empty()),
            api_key: api_key.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Returns true when both URL and API key are present and non-empty.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url().is_some() && self.api_key().is_some()
    }

    /// Returns the base URL with any trailing slash trimmed, or `None` when unset.
    ///
    /// The trimmed form is the canonical base every resolved URL is built from,
    /// so `https://host/` and `https://host` resolve identically.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.trim_end_matches('/').to_string())
    }

    /// Returns the API key, or `None` when unset or empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    }

    /// Validates the settings, collecting every issue found.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] listing each problem: missing URL,
    /// unparseable URL, non-http(s) scheme, or missing API key.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut issues = Vec::new();

        match self.base_url() {
            None => issues.push("server URL required".to_string()),
            Some(url) => match Url::parse(&url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => issues.push(format!(
                    "URL must use http or https protocol (got {})",
                    parsed.scheme()
                )),
                Err(_) => issues.push("invalid URL format".to_string()),
            },
        }

        if self.api_key().is_none() {
            issues.push("api key required".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Invalid { issues })
        }
    }
}

/// Synchronous connection getters consumed by the URL resolver and image cache.
///
/// Keeping this a narrow trait means the core image pipeline can be driven by
/// a [`SettingsHandle`], a fixed [`ServerSettings`], or a test double without
/// touching persisted state.
pub trait ConnectionSource: Send + Sync {
    /// Current base URL, trailing slash trimmed, or `None` when unconfigured.
    fn base_url(&self) -> Option<String>;
    /// Current API key, or `None` when unconfigured.
    fn api_key(&self) -> Option<String>;
}

impl ConnectionSource for ServerSettings {
    fn base_url(&self) -> Option<String> {
        ServerSettings::base_url(self)
    }

    fn api_key(&self) -> Option<String> {
        ServerSettings::api_key(self)
    }
}

/// Shared, read-mostly live view of the server settings.
///
/// Loaded once at startup and replaced only by an explicit save. Cloning is
/// cheap; all clones observe the same underlying settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<ServerSettings>>,
}

impl SettingsHandle {
    /// Creates a handle seeded with the given settings.
    #[must_use]
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns a snapshot of the current settings.
    #[must_use]
    pub fn get(&self) -> ServerSettings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current settings. Called after a successful save.
    pub fn replace(&self, settings: ServerSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }
}

impl ConnectionSource for SettingsHandle {
    fn base_url(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .base_url()
    }

    fn api_key(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api_key()
    }
}
