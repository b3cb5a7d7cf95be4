//! Pure URL resolution for cover-art references.
//!
//! A raw image reference from the server comes in three shapes: an absolute
//! `http(s)` URL, a server-relative protected path (`MediaCover/...`, the
//! API-key-guarded cover endpoints), or any other relative path.
//! [`resolve_image_url`] maps a reference plus the current connection into a
//! final fetch-ready URL, or `None` when nothing can be resolved.
//!
//! Resolution is synchronous, pure and idempotent: feeding an already
//! resolved URL back in yields the same URL and never double-appends the
//! `apikey` query parameter.

use url::Url;

use crate::settings::ConnectionSource;

/// Static placeholder shown whenever resolution or fetching fails.
pub const NO_COVER_ASSET: &str = "assets/no-cover.svg";

/// Path segment that marks a reference as API-key-protected.
///
/// Matched case-insensitively at the start of the reference, with or without
/// a leading slash.
pub const PROTECTED_PREFIX: &str = "MediaCover/";

/// API route prefix protected references are rewritten under.
const API_PREFIX: &str = "api/v1";

/// Query parameter name carrying the API key on protected image requests.
///
/// The key travels as a query parameter rather than a header so image
/// requests stay simple requests and never trigger a CORS preflight.
const API_KEY_PARAM: &str = "apikey";

/// Returns true when the reference points at a protected cover endpoint.
///
/// Only server-relative references match; an absolute URL that happens to
/// contain `MediaCover` in its path is treated as pre-authorized and left
/// alone by the resolver's absolute-URL rule.
#[must_use]
pub fn needs_authentication(reference: &str) -> bool {
    let trimmed = reference.strip_prefix('/').unwrap_or(reference);
    trimmed.len() >= PROTECTED_PREFIX.len()
        && trimmed[..PROTECTED_PREFIX.len()].eq_ignore_ascii_case(PROTECTED_PREFIX)
}

/// Returns true when the reference is already an absolute `http(s)` URL.
#[must_use]
pub fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Resolves a raw image reference into a final fetchable URL.
///
/// Returns `None` ("no image") when the reference is empty, no server is
/// configured, a protected path has no API key available, or URL
/// construction fails at any step. Callers fall back to
/// [`NO_COVER_ASSET`] in that case.
#[must_use]
pub fn resolve_image_url(reference: &str, conn: &dyn ConnectionSource) -> Option<Url> {
    if reference.trim().is_empty() {
        return None;
    }

    // Nothing is resolvable without a configured server, not even
    // already-absolute references: an unconfigured client shows placeholders.
    let base = conn.base_url()?;

    if needs_authentication(reference) {
        let api_key = conn.api_key()?;
        let path = reference.strip_prefix('/').unwrap_or(reference);
        let mut resolved = Url::parse(&format!("{base}/{API_PREFIX}/{path}")).ok()?;
        let has_key = resolved
            .query_pairs()
            .any(|(name, _)| name == API_KEY_PARAM);
        if !has_key {
            resolved
                .query_pairs_mut()
                .append_pair(API_KEY_PARAM, &api_key);
        }
        return Some(resolved);
    }

    if is_absolute(reference) {
        // Pre-authorized or public; pass through without key injection.
        return Url::parse(reference).ok();
    }

    let path = reference.strip_prefix('/').unwrap_or(reference);
    Url::parse(&format!("{base}/{path}")).ok()
}
