//! Host platform interfaces.
//!
//! The embed pipeline never talks to storage or the wall clock directly.
//! A host embedding this crate supplies:
//!
//! - [`OptionsStore`]: process-wide persisted configuration records
//! - [`MetaStore`]: per-content-scope key/value records (embed cache)
//! - [`Clock`]: current time, injectable for cache-expiry tests
//!
//! [`MemoryStore`] implements the storage traits in memory and backs the
//! CLI and the test suite.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ordered string-to-string option bag.
///
/// Checkbox-style options use `"on"` for enabled and an empty string (or an
/// absent key) for disabled, matching the persisted settings layout.
pub type OptionMap = BTreeMap<String, String>;

/// Build an [`OptionMap`] from `(key, value)` pairs. Test and setup helper.
pub fn option_map<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> OptionMap {
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Merge `overrides` on top of `defaults`, returning a new map.
///
/// Keys present in `overrides` win; all other keys keep their default value.
pub fn merge_options(overrides: &OptionMap, defaults: &OptionMap) -> OptionMap {
    let mut merged = defaults.clone();
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Named configuration records persisted by the host.
pub trait OptionsStore: Send + Sync {
    /// Fetch a configuration record, or `None` if it was never written.
    fn get_option(&self, key: &str) -> Option<OptionMap>;

    /// Create or overwrite a configuration record.
    fn set_option(&self, key: &str, value: OptionMap);

    /// Remove a configuration record.
    fn delete_option(&self, key: &str);
}

/// Per-content-scope key/value records.
///
/// A scope is the identifier of the content unit (a document, a post) that
/// owns its cache entries; entries are never shared across scopes.
pub trait MetaStore: Send + Sync {
    fn get_meta(&self, scope: &str, key: &str) -> Option<String>;
    fn set_meta(&self, scope: &str, key: &str, value: &str);
}

/// Source of the current time, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Wall-clock [`Clock`] implementation.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// In-memory [`OptionsStore`] + [`MetaStore`].
#[derive(Default)]
pub struct MemoryStore {
    options: Mutex<HashMap<String, OptionMap>>,
    meta: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionsStore for MemoryStore {
    fn get_option(&self, key: &str) -> Option<OptionMap> {
        self.options.lock().ok()?.get(key).cloned()
    }

    fn set_option(&self, key: &str, value: OptionMap) {
        if let Ok(mut options) = self.options.lock() {
            options.insert(key.to_string(), value);
        }
    }

    fn delete_option(&self, key: &str) {
        if let Ok(mut options) = self.options.lock() {
            options.remove(key);
        }
    }
}

impl MetaStore for MemoryStore {
    fn get_meta(&self, scope: &str, key: &str) -> Option<String> {
        self.meta
            .lock()
            .ok()?
            .get(&(scope.to_string(), key.to_string()))
            .cloned()
    }

    fn set_meta(&self, scope: &str, key: &str, value: &str) {
        if let Ok(mut meta) = self.meta.lock() {
            meta.insert((scope.to_string(), key.to_string()), value.to_string());
        }
    }
}
