//! Covercache Core Library
//!
//! Client-side core for browsing a Readarr/Chaptarr-style library server:
//! server connection settings with validation and persistence, a
//! connectivity probe, and the authenticated cover-art pipeline (URL
//! resolution, fetch caching with request coalescing, and a binding adapter
//! for visual elements).
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`settings`] - server connection model, validation, persistence
//! - [`image`] - cover-art resolution, fetching, caching and binding
//! - [`system`] - connectivity probe behind the configure-server gate

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod image;
pub mod settings;
pub mod system;

// Re-export commonly used types
pub use image::{
    FetchError, HttpImageFetcher, ImageBinding, ImageCache, ImageFetcher, ImageHandle,
    ImageSink, ImageSource, NO_COVER_ASSET, needs_authentication, resolve_image_url,
};
pub use settings::{
    ConnectionSource, ServerSettings, SettingsError, SettingsHandle, SettingsStore,
};
pub use system::{ConnectionStatus, SystemClient, SystemStatus};
