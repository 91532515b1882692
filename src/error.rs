//! Crate error type.

use thiserror::Error;

/// Errors surfaced by embedkit internals.
///
/// Nothing in the render pipeline propagates these into page output; they
/// exist for callers of the lower-level APIs (HTTP fetch, client setup)
/// and are otherwise logged and degraded to fallbacks.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// A metadata fetch failed (network, TLS, non-success status).
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("http client setup failed")]
    Client(#[from] reqwest::Error),
}
