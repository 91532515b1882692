//! Configuration loaded from `~/.config/embedkit/config.toml`.
//!
//! Hosts embedding the library bring their own persisted settings; the
//! CLI and other standalone consumers seed a [`MemoryStore`] from a TOML
//! file instead. Absent file means shipped defaults.
//!
//! ```toml
//! [providers]
//! facebook = "on"
//!
//! [options.bandcamp]
//! layout = "slim"
//! bgcol = "#333333"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::host::{merge_options, MemoryStore, OptionMap, OptionsStore};
use crate::providers;
use crate::settings::{self, option_key, PROVIDERS_OPTION};

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Provider enable toggles, `"on"` or `""`.
    #[serde(default)]
    providers: OptionMap,
    /// Per-provider option overrides, keyed by embed id.
    #[serde(default)]
    options: std::collections::BTreeMap<String, OptionMap>,
}

impl ConfigFile {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML for this shape.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid embedkit configuration")
    }

    /// Load from a file, or shipped defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    /// Build a settings store: shipped defaults with this file's values
    /// merged on top. Unknown provider ids in the file are ignored.
    pub fn into_store(self) -> MemoryStore {
        let store = MemoryStore::new();
        settings::ensure_installed(&store);

        if !self.providers.is_empty() {
            let current = store.get_option(PROVIDERS_OPTION).unwrap_or_default();
            store.set_option(PROVIDERS_OPTION, merge_options(&known_toggles(&self.providers), &current));
        }

        for provider in providers::all() {
            let desc = provider.descriptor();
            let Some(overrides) = self.options.get(desc.embed_id) else { continue };
            let key = option_key(desc.embed_id);
            let current = store.get_option(&key).unwrap_or_default();
            store.set_option(&key, merge_options(overrides, &current));
        }

        store
    }
}

fn known_toggles(submitted: &OptionMap) -> OptionMap {
    submitted
        .iter()
        .filter(|(id, _)| settings::default_providers().contains_key(id.as_str()))
        .map(|(id, v)| (id.clone(), v.clone()))
        .collect()
}

/// Default configuration file location.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("embedkit")
        .join("config.toml")
}
