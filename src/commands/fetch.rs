//! Fetch command handler: pull one cover through the cache.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use covercache::{
    HttpImageFetcher, ImageCache, SettingsStore, needs_authentication, resolve_image_url,
};

/// Resolves and fetches one cover-art reference, writing the bytes to
/// `output` when given.
///
/// Returns `Ok(false)` when the reference does not resolve or the fetch
/// fails — the same "show the placeholder" outcome the app would take —
/// so the caller can exit nonzero without treating it as an error.
pub async fn run_fetch_command(
    store: &SettingsStore,
    reference: &str,
    output: Option<&Path>,
) -> Result<bool> {
    let settings = Arc::new(store.load()?.unwrap_or_default());

    let Some(resolved) = resolve_image_url(reference, settings.as_ref()) else {
        println!("resolved = <no image>");
        if !settings.is_configured() {
            println!("hint = no server configured; run: covercache config set");
        }
        return Ok(false);
    };
    println!("resolved = {resolved}");
    println!("authenticated = {}", needs_authentication(reference));

    let cache = ImageCache::new(settings, Arc::new(HttpImageFetcher::new()));
    let Some(handle) = cache.load(reference).await else {
        println!("fetched = false (placeholder would be shown)");
        return Ok(false);
    };

    debug!(bytes = handle.len(), "Cover fetched");
    println!("fetched = true");
    println!("bytes = {}", handle.len());
    if let Some(content_type) = handle.content_type() {
        println!("content_type = {content_type}");
    }

    if let Some(path) = output {
        std::fs::write(path, handle.bytes())
            .with_context(|| format!("failed to write cover to {}", path.display()))?;
        println!("written = {}", path.display());
    }

    Ok(true)
}
