//! Per-scope embed markup cache.
//!
//! Rendered markup is cached in the host's per-scope meta store under a
//! fingerprint of the source URL and raw attributes, next to a write
//! timestamp. Entries expire after roughly one week; the exact TTL carries
//! 1-1440 minutes of random jitter and is recomputed on every lookup so
//! that a page full of embeds does not refetch them all in the same
//! render. Cache trouble of any kind degrades to a miss.

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::host::{Clock, MetaStore, OptionMap};

/// Nominal cache lifetime before jitter.
pub const WEEK_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Nominal TTL plus 1-1440 minutes of random jitter.
pub fn jittered_ttl() -> u64 {
    WEEK_SECONDS + 60 * rand::thread_rng().gen_range(1..=1440)
}

/// Stable fingerprint over a source URL and its raw attributes.
///
/// Attributes are serialized as JSON so that the fingerprint is
/// insensitive to anything but key/value content; `OptionMap` ordering is
/// already canonical.
pub fn fingerprint(url: &str, raw_attrs: &OptionMap) -> String {
    let attrs_json = serde_json::to_string(raw_attrs).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(attrs_json.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

fn markup_key(embed_id: &str, fp: &str) -> String {
    format!("_embed_{embed_id}_{fp}")
}

fn time_key(embed_id: &str, fp: &str) -> String {
    format!("_embed_{embed_id}_time_{fp}")
}

/// Cache facade over the host meta store.
pub struct EmbedCache<'a> {
    meta: &'a dyn MetaStore,
    clock: &'a dyn Clock,
}

impl<'a> EmbedCache<'a> {
    pub fn new(meta: &'a dyn MetaStore, clock: &'a dyn Clock) -> Self {
        Self { meta, clock }
    }

    /// Fetch cached markup, or `None` when there is no scope, no entry,
    /// or the entry's age has reached `ttl`.
    pub fn get(&self, scope: Option<&str>, embed_id: &str, fp: &str, ttl: u64) -> Option<String> {
        let scope = scope?;

        let markup = self.meta.get_meta(scope, &markup_key(embed_id, fp))?;
        if markup.is_empty() {
            return None;
        }

        let written: u64 = self
            .meta
            .get_meta(scope, &time_key(embed_id, fp))
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);

        let age = self.clock.now_unix().saturating_sub(written);
        if age >= ttl {
            debug!(embed_id, age, ttl, "cached embed expired");
            return None;
        }

        Some(markup)
    }

    /// Store rendered markup. Silent no-op when there is no scope or the
    /// markup is empty.
    pub fn put(&self, scope: Option<&str>, embed_id: &str, fp: &str, markup: &str) {
        let Some(scope) = scope else { return };
        if markup.is_empty() {
            return;
        }

        self.meta.set_meta(scope, &markup_key(embed_id, fp), markup);
        self.meta
            .set_meta(scope, &time_key(embed_id, fp), &self.clock.now_unix().to_string());
    }
}
