//! Provider registry and the content transformation entry point.
//!
//! A [`Registry`] is the enabled subset of the provider roster, each
//! bound to its saved options. [`Registry::transform_content`] is the
//! main entry point: it rewrites a block of text in two passes,
//!
//! 1. **Autoembed**: any line that consists of a single bare URL matched
//!    by an enabled markup-producing provider is replaced with that
//!    provider's markup. oEmbed providers only contribute registrations
//!    for the host's own oEmbed pipeline. URLs inside prose or markup
//!    are left alone, which also makes the transformation stable under
//!    repetition.
//! 2. **Shortcodes**: explicit `[tag ...]` invocations are expanded for
//!    providers that declare a tag. Unusable shortcodes are replaced
//!    with an explanatory message rather than dropped.
//!
//! Providers run in registration order; the first one whose pattern
//! matches a URL owns it.

use tracing::debug;

use crate::descriptor::EmbedType;
use crate::embedder::{EmbedEnv, Embedder, OEmbedRegistration};
use crate::endpoint;
use crate::host::{OptionMap, OptionsStore};
use crate::matcher;
use crate::providers;
use crate::settings::{self, option_key, PROVIDERS_OPTION};
use crate::shortcode;

/// The enabled providers, bound to their saved options.
pub struct Registry {
    embedders: Vec<Embedder>,
}

impl Registry {
    /// Build the registry from the host store: bootstrap missing records,
    /// then bind every enabled provider to its saved options.
    pub fn from_store(store: &dyn OptionsStore) -> Self {
        settings::ensure_installed(store);

        let enabled = store
            .get_option(PROVIDERS_OPTION)
            .unwrap_or_else(settings::default_providers);

        let embedders = providers::all()
            .into_iter()
            .filter(|provider| {
                let id = provider.descriptor().embed_id;
                enabled.get(id).map(String::as_str) == Some("on")
            })
            .map(|provider| {
                let saved = store
                    .get_option(&option_key(provider.descriptor().embed_id))
                    .unwrap_or_default();
                Embedder::new(provider, saved)
            })
            .collect();

        Self { embedders }
    }

    /// Every provider enabled, default options. Test and tooling helper.
    pub fn with_all_providers() -> Self {
        let embedders = providers::all()
            .into_iter()
            .map(|provider| Embedder::new(provider, OptionMap::new()))
            .collect();
        Self { embedders }
    }

    pub fn embedders(&self) -> &[Embedder] {
        &self.embedders
    }

    pub fn is_empty(&self) -> bool {
        self.embedders.is_empty()
    }

    /// First enabled provider whose pattern matches `url`, with the
    /// endpoint it resolves to. No rendering, no caching.
    pub fn resolve_src(&self, url: &str) -> Option<(&'static str, String)> {
        self.embedders.iter().find_map(|embedder| {
            let desc = embedder.descriptor();
            let m = matcher::first_match(&desc.pattern, url)?;
            Some((desc.embed_id, endpoint::resolve(&desc.endpoint, &m)))
        })
    }

    /// Aggregated oEmbed registrations across the enabled providers.
    pub fn oembed_registrations(&self) -> Vec<OEmbedRegistration> {
        self.embedders
            .iter()
            .filter(|embedder| embedder.descriptor().embed_type == EmbedType::OEmbed)
            .flat_map(|embedder| embedder.oembed_registrations())
            .collect()
    }

    /// Rewrite `content`, replacing bare-URL lines and shortcodes with
    /// embed markup.
    pub async fn transform_content(&self, content: &str, env: &EmbedEnv<'_>) -> String {
        let content = self.autoembed(content, env).await;
        self.expand_shortcodes(&content, env).await
    }

    async fn autoembed(&self, content: &str, env: &EmbedEnv<'_>) -> String {
        let mut out = String::with_capacity(content.len());

        for (i, line) in content.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }

            let url = line.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) || url.contains(char::is_whitespace) {
                out.push_str(line);
                continue;
            }

            // oEmbed providers hand their URLs to the host's own oEmbed
            // pipeline via the registration list; only markup-producing
            // providers transform content here.
            let Some(embedder) = self
                .embedders
                .iter()
                .filter(|e| e.descriptor().embed_type != EmbedType::OEmbed)
                .find(|e| matcher::first_match(&e.descriptor().pattern, url).is_some())
            else {
                out.push_str(line);
                continue;
            };

            debug!(embed_id = embedder.embed_id(), url, "autoembedding url line");
            let html = embedder
                .handle(url, &OptionMap::new(), &OptionMap::new(), env)
                .await;
            let prefix_len = line.len() - line.trim_start().len();
            out.push_str(&line[..prefix_len]);
            out.push_str(&html);
        }

        out
    }

    async fn expand_shortcodes(&self, content: &str, env: &EmbedEnv<'_>) -> String {
        let mut content = content.to_string();

        for embedder in &self.embedders {
            let Some(tag) = embedder.descriptor().shortcode else { continue };

            // Splice back to front so earlier ranges stay valid.
            let found = shortcode::find_shortcodes(tag, &content);
            for sc in found.into_iter().rev() {
                let replacement = match embedder.provider().expand_shortcode(&sc.attrs) {
                    Ok((url, attrs)) => embedder.handle(&url, &attrs, &sc.attrs, env).await,
                    Err(message) => message,
                };
                content.replace_range(sc.range.0..sc.range.1, &replacement);
            }
        }

        content
    }
}
