//! Base embedder: the provider contract and the embed pipeline.
//!
//! Every matched URL runs the same state machine:
//!
//! ```text
//! MATCHED -> CACHE_CHECK -> (hit)  -> DONE
//!                        -> (miss) -> PRE_EMBED -> SRC_RESOLVED
//!                                   -> CUSTOMIZE -> MARKUP -> CACHE_WRITE -> DONE
//! ```
//!
//! [`Provider`] implementations override only the hooks they need:
//! `pre_embed` to rewrite captures before endpoint resolution (Bandcamp
//! resolves slugs to numeric ids there), `customize` to parameterize the
//! resolved source or to short-circuit with ready-made markup (VEVO).
//! A hook that produces nothing falls through to the embed-type default,
//! and no failure anywhere in the pipeline aborts the surrounding render.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::cache::{self, EmbedCache};
use crate::descriptor::{EmbedDescriptor, EmbedType};
use crate::endpoint;
use crate::host::{merge_options, Clock, MetaStore, OptionMap};
use crate::http::HttpFetch;
use crate::matcher::{self, MatchResult};

/// Per-request environment threaded through the pipeline.
pub struct EmbedEnv<'a> {
    pub meta: &'a dyn MetaStore,
    pub http: &'a dyn HttpFetch,
    pub clock: &'a dyn Clock,
    /// Identity of the content unit being rendered; `None` outside a
    /// persisted scope (caching is skipped in that case).
    pub scope: Option<String>,
}

/// One matched URL occurrence, mutated through the pipeline stages and
/// discarded after the render pass.
#[derive(Debug, Clone)]
pub struct EmbedItem {
    /// The matched source URL; doubles as the item identity for the pass.
    pub url: String,
    pub matches: MatchResult,
    /// Attributes supplied by the invocation (shortcode attributes, host
    /// embed attributes).
    pub attrs: OptionMap,
    /// Unprocessed attributes; part of the cache fingerprint.
    pub raw_attrs: OptionMap,
    /// Saved provider options merged over invocation attributes.
    pub options: OptionMap,
    /// Resolved embed source. Empty until `SRC_RESOLVED`; a `pre_embed`
    /// hook may set it early to skip template resolution.
    pub src: String,
    /// Computed inline CSS, property to value.
    pub styles: BTreeMap<String, String>,
}

/// Customization surface of one concrete provider.
#[async_trait]
pub trait Provider: Send + Sync {
    fn descriptor(&self) -> &EmbedDescriptor;

    /// Hook run before endpoint resolution. May rewrite the item's
    /// captures or set `src` directly. Default: identity.
    async fn pre_embed(&self, _item: &mut EmbedItem, _env: &EmbedEnv<'_>) {}

    /// Hook run after endpoint resolution. Returning markup
    /// short-circuits generation; returning `None` lets the embed-type
    /// default produce the markup from the (possibly mutated) item.
    /// `defaults` are the provider's saved options for fallback values.
    fn customize(&self, _item: &mut EmbedItem, _defaults: &OptionMap) -> Option<String> {
        None
    }

    /// Expand shortcode attributes into a synthetic URL plus the
    /// attribute set the pipeline runs with. `Err` carries replacement
    /// text shown in place of an unusable shortcode. Only invoked for
    /// providers whose descriptor declares a shortcode tag.
    fn expand_shortcode(&self, _attrs: &OptionMap) -> Result<(String, OptionMap), String> {
        Err(String::new())
    }

    /// Cache lifetime for this provider's entries, recomputed per lookup.
    fn cache_ttl(&self) -> u64 {
        cache::jittered_ttl()
    }
}

/// oEmbed provider registration handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OEmbedRegistration {
    pub pattern: String,
    pub endpoint: String,
    pub secure: bool,
}

/// Shape of an oEmbed response object as far as the responsive wrapper
/// cares: only the provider name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OEmbedData {
    pub provider_name: Option<String>,
}

/// A provider bound to its saved options; runs the pipeline.
pub struct Embedder {
    provider: Box<dyn Provider>,
    /// Saved options merged over the schema defaults.
    options: OptionMap,
}

impl Embedder {
    /// Bind a provider to options loaded from the host store. Missing or
    /// partial records fall back to the schema defaults.
    pub fn new(provider: Box<dyn Provider>, saved: OptionMap) -> Self {
        let defaults = provider.descriptor().default_options();
        let options = merge_options(&saved, &defaults);
        Self { provider, options }
    }

    pub fn descriptor(&self) -> &EmbedDescriptor {
        self.provider.descriptor()
    }

    pub fn embed_id(&self) -> &'static str {
        self.descriptor().embed_id
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub(crate) fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Flat (pattern, endpoint) registrations for the host's oEmbed
    /// whitelist. Scheme mappings expand to one registration per pairing.
    pub fn oembed_registrations(&self) -> Vec<OEmbedRegistration> {
        let desc = self.descriptor();
        desc.pattern
            .patterns()
            .iter()
            .filter_map(|pattern| {
                let endpoint = desc.endpoint.template_for(pattern.scheme)?;
                Some(OEmbedRegistration {
                    pattern: pattern.regex.to_string(),
                    endpoint: endpoint.to_string(),
                    secure: true,
                })
            })
            .collect()
    }

    /// Run the pipeline for one matched URL. Returns the original URL
    /// unchanged when the provider's pattern does not actually match it.
    pub async fn handle(
        &self,
        url: &str,
        attrs: &OptionMap,
        raw_attrs: &OptionMap,
        env: &EmbedEnv<'_>,
    ) -> String {
        let desc = self.descriptor();

        let Some(matches) = matcher::first_match(&desc.pattern, url) else {
            debug!(embed_id = desc.embed_id, url, "handler invoked on non-matching url");
            return url.to_string();
        };

        let mut item = EmbedItem {
            url: url.to_string(),
            matches,
            attrs: attrs.clone(),
            raw_attrs: raw_attrs.clone(),
            options: merge_options(attrs, &self.options),
            src: String::new(),
            styles: BTreeMap::new(),
        };

        // CACHE_CHECK. TTL computed fresh per lookup, jitter included.
        let cache = EmbedCache::new(env.meta, env.clock);
        let fp = cache::fingerprint(url, raw_attrs);
        if desc.use_cache {
            if let Some(cached) = cache.get(env.scope.as_deref(), desc.embed_id, &fp, self.provider.cache_ttl()) {
                debug!(embed_id = desc.embed_id, url, "serving cached embed");
                return cached;
            }
        }

        // PRE_EMBED.
        self.provider.pre_embed(&mut item, env).await;

        // SRC_RESOLVED, unless the hook already supplied one.
        if item.src.is_empty() {
            item.src = endpoint::resolve(&desc.endpoint, &item.matches);
        }

        // CUSTOMIZE, falling through to the embed-type default.
        let html = self
            .provider
            .customize(&mut item, &self.options)
            .unwrap_or_else(|| match desc.embed_type {
                EmbedType::Iframe => render_iframe(desc, &self.options, &item),
                EmbedType::OEmbed | EmbedType::Javascript | EmbedType::Default => String::new(),
            });

        // CACHE_WRITE.
        if desc.use_cache {
            cache.put(env.scope.as_deref(), desc.embed_id, &fp, &html);
        }

        html
    }

    /// Responsive post-processing for oEmbed markup. See
    /// [`make_responsive`].
    pub fn make_responsive(&self, html: &str, data: Option<&OEmbedData>) -> String {
        make_responsive(self.embed_id(), html, data)
    }
}

/// Wrap oEmbed markup in a responsive container when the provider hint
/// matches `embed_id` case-insensitively. No hint at all means the markup
/// is known to be ours and always wraps; a hint without a provider name
/// passes through untouched.
pub fn make_responsive(embed_id: &str, html: &str, data: Option<&OEmbedData>) -> String {
    let provider_name = match data {
        None => embed_id.to_string(),
        Some(data) => data.provider_name.clone().unwrap_or_default(),
    };

    if provider_name.to_lowercase() == embed_id {
        format!(r#"<div class="responsive-embed-container">{html}</div>"#)
    } else {
        html.to_string()
    }
}

/// Escape text for inclusion in a single- or double-quoted HTML attribute.
pub(crate) fn attr_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// User-facing message embedded as iframe fallback content.
fn error_message(embed_type: EmbedType) -> String {
    let detail = match embed_type {
        EmbedType::Iframe => {
            "This feature requires inline frames. You have iframes disabled or your browser does not support them."
        }
        EmbedType::OEmbed | EmbedType::Javascript => "JavaScript must be enabled to use this feature.",
        EmbedType::Default => "This link is not live-previewable.",
    };
    format!(
        "<strong>HTML Embed: An unidentified error has occurred.</strong>\
         <span class=\"error-message\">{detail}</span>"
    )
}

/// Generic iframe markup for an embedded item.
///
/// Width and height fall back from the item's options to the provider
/// defaults; the fallback content covers environments without iframe
/// support, and the comment pair identifies provider and source URL for
/// debugging.
pub fn render_iframe(desc: &EmbedDescriptor, defaults: &OptionMap, item: &EmbedItem) -> String {
    let url = attr_escape(&item.url);
    let src = attr_escape(&item.src);
    let class = format!("embed-iframe embed-{}", desc.embed_id);

    let dimension = |key: &str| -> i64 {
        item.options
            .get(key)
            .or_else(|| defaults.get(key))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };
    let width = dimension("width");
    let height = dimension("height");

    let style: String = item
        .styles
        .iter()
        .map(|(property, value)| format!("{property}:{value};"))
        .collect();
    let style = attr_escape(&style);

    let allowfullscreen = "allowfullscreen='true' webkitallowfullscreen='true' \
                           mozallowfullscreen='true' oallowfullscreen='true' msallowfullscreen='true'";

    let mut iframe = format!("<!-- Starting {} iframe embed for {} -->", desc.embed_id, url);
    iframe.push_str(&format!(
        "<iframe src='{src}' class='{class}' width='{width}' height='{height}' \
         data-url='{url}' frameborder='0' style='{style}' {allowfullscreen}>"
    ));
    iframe.push_str(&error_message(desc.embed_type));
    iframe.push_str(&format!(
        "<span class=\"error-link\"><a href=\"{url}\" target=\"_blank\">Open link in a new tab.</a></span>"
    ));
    iframe.push_str("</iframe>");
    iframe.push_str(&format!("<!-- Ending {} iframe embed for {} -->", desc.embed_id, url));
    iframe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EndpointSpec, Pattern, PatternSpec};
    use crate::host::{option_map, MemoryStore, SystemClock};
    use crate::http::NullFetcher;

    fn iframe_descriptor() -> EmbedDescriptor {
        EmbedDescriptor {
            embed_id: "demo",
            name: "Demo",
            embed_type: EmbedType::Iframe,
            pattern: PatternSpec::One(Pattern::new(r"https?://demo\.example/(?P<id>\w+)")),
            endpoint: EndpointSpec::Template("https://embed.demo.example/{id}"),
            settings: vec![],
            use_cache: false,
            shortcode: None,
        }
    }

    struct DemoProvider {
        descriptor: EmbedDescriptor,
    }

    impl DemoProvider {
        fn new() -> Self {
            Self { descriptor: iframe_descriptor() }
        }
    }

    #[async_trait]
    impl Provider for DemoProvider {
        fn descriptor(&self) -> &EmbedDescriptor {
            &self.descriptor
        }
    }

    fn env(store: &MemoryStore) -> EmbedEnv<'_> {
        EmbedEnv {
            meta: store,
            http: &NullFetcher,
            clock: &SystemClock,
            scope: None,
        }
    }

    #[tokio::test]
    async fn pipeline_resolves_and_renders_iframe() {
        let store = MemoryStore::new();
        let embedder = Embedder::new(
            Box::new(DemoProvider::new()),
            option_map([("width", "640"), ("height", "360")]),
        );

        let html = embedder
            .handle("https://demo.example/abc", &OptionMap::new(), &OptionMap::new(), &env(&store))
            .await;

        assert!(html.contains("src='https://embed.demo.example/abc'"));
        assert!(html.contains("width='640'"));
        assert!(html.contains("height='360'"));
        assert!(html.contains("class='embed-iframe embed-demo'"));
        assert!(html.contains("<!-- Starting demo iframe embed for https://demo.example/abc -->"));
        assert!(html.contains("Open link in a new tab."));
    }

    #[tokio::test]
    async fn non_matching_url_passes_through() {
        let store = MemoryStore::new();
        let embedder = Embedder::new(Box::new(DemoProvider::new()), OptionMap::new());
        let html = embedder
            .handle("https://other.example/x", &OptionMap::new(), &OptionMap::new(), &env(&store))
            .await;
        assert_eq!(html, "https://other.example/x");
    }

    #[test]
    fn responsive_wrapper_matches_case_insensitively() {
        let hint = OEmbedData { provider_name: Some("Twitch".to_string()) };
        let wrapped = make_responsive("twitch", "<video></video>", Some(&hint));
        assert_eq!(wrapped, r#"<div class="responsive-embed-container"><video></video></div>"#);
    }

    #[test]
    fn responsive_wrapper_passes_through_foreign_providers() {
        let hint = OEmbedData { provider_name: Some("YouTube".to_string()) };
        assert_eq!(make_responsive("twitch", "<x/>", Some(&hint)), "<x/>");
    }

    #[test]
    fn responsive_wrapper_without_hint_always_wraps() {
        let wrapped = make_responsive("vevo", "<x/>", None);
        assert!(wrapped.starts_with("<div class=\"responsive-embed-container\">"));
    }

    #[test]
    fn responsive_hint_deserializes_from_oembed_json() {
        let data: OEmbedData =
            serde_json::from_str(r#"{"provider_name":"Twitch","type":"video"}"#).unwrap();
        assert_eq!(data.provider_name.as_deref(), Some("Twitch"));
    }

    #[test]
    fn attr_escape_covers_quotes() {
        assert_eq!(attr_escape("a'b\"c&d"), "a&#039;b&quot;c&amp;d");
    }

    #[test]
    fn styles_render_in_stable_order() {
        let mut item = EmbedItem {
            url: "https://demo.example/a".to_string(),
            matches: matcher::first_match(
                &iframe_descriptor().pattern,
                "https://demo.example/a",
            )
            .unwrap(),
            attrs: OptionMap::new(),
            raw_attrs: OptionMap::new(),
            options: OptionMap::new(),
            src: "https://embed.demo.example/a".to_string(),
            styles: BTreeMap::new(),
        };
        item.styles.insert("max-width".to_string(), "700px".to_string());
        item.styles.insert("min-width".to_string(), "170px".to_string());

        let html = render_iframe(&iframe_descriptor(), &OptionMap::new(), &item);
        assert!(html.contains("max-width:700px;min-width:170px;"));
    }

    #[test]
    fn oembed_registrations_expand_scheme_mappings() {
        struct SchemeProvider {
            descriptor: EmbedDescriptor,
        }

        #[async_trait]
        impl Provider for SchemeProvider {
            fn descriptor(&self) -> &EmbedDescriptor {
                &self.descriptor
            }
        }

        let embedder = Embedder::new(
            Box::new(SchemeProvider {
                descriptor: EmbedDescriptor {
                    embed_id: "demo",
                    name: "Demo",
                    embed_type: EmbedType::OEmbed,
                    pattern: PatternSpec::Any(vec![
                        Pattern::with_scheme(r"https?://d\.example/v/.*", "video"),
                        Pattern::with_scheme(r"https?://d\.example/p/.*", "post"),
                        Pattern::with_scheme(r"https?://d\.example/clip/.*", "video"),
                    ]),
                    endpoint: EndpointSpec::ByScheme(vec![
                        ("video", "https://d.example/oembed/video"),
                        ("post", "https://d.example/oembed/post"),
                    ]),
                    settings: vec![],
                    use_cache: false,
                    shortcode: None,
                },
            }),
            OptionMap::new(),
        );

        let regs = embedder.oembed_registrations();
        assert_eq!(regs.len(), 3);
        assert_eq!(regs[0].endpoint, "https://d.example/oembed/video");
        assert_eq!(regs[1].endpoint, "https://d.example/oembed/post");
        assert_eq!(regs[2].endpoint, "https://d.example/oembed/video");
        assert!(regs.iter().all(|r| r.secure));
    }
}
