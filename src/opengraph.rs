//! Open Graph metadata scraper.
//!
//! Single-pass scan of a page's `<meta>` tags collecting `og:*` and
//! `twitter:*` properties, plus the usual fallbacks for pages that only
//! ship a `<title>`, a bare description, or an `image_src` link. Property
//! names are normalized (`og:video:secure_url` becomes
//! `video_secure_url`); repeated properties keep the first value and
//! collect the rest under [`OpenGraph::additional`].
//!
//! Bandcamp's `pre_embed` hook is the main consumer: it reads the
//! `video`/`video_secure_url` property of an album or track page and
//! harvests numeric ids from its query string.

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use tracing::warn;

use crate::http::HttpFetch;

/// Base schema names by `og:type` value.
const SCHEMA_TYPES: &[(&str, &[&str])] = &[
    ("activity", &["activity", "sport"]),
    ("business", &["bar", "company", "cafe", "hotel", "restaurant"]),
    ("group", &["cause", "sports_league", "sports_team"]),
    ("organization", &["band", "government", "non_profit", "school", "university"]),
    ("person", &["actor", "athlete", "author", "director", "musician", "politician", "public_figure"]),
    ("place", &["city", "country", "landmark", "state_province"]),
    ("product", &["album", "book", "drink", "food", "game", "movie", "product", "song", "tv_show"]),
    ("website", &["blog", "website"]),
];

/// Parsed Open Graph data for one page.
#[derive(Debug, Default, Clone)]
pub struct OpenGraph {
    values: BTreeMap<String, String>,
    additional: BTreeMap<String, Vec<String>>,
}

fn normalize_key(raw: &str) -> String {
    raw.replace(['-', ':'], "_")
}

impl OpenGraph {
    /// Fetch a page and parse it. Any failure (network, empty body, no
    /// usable tags) yields `None`; the caller treats that as "no
    /// metadata" and falls back.
    pub async fn fetch(url: &str, http: &dyn HttpFetch) -> Option<Self> {
        let html = match http.fetch_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "metadata fetch failed");
                return None;
            }
        };
        Self::parse(&html)
    }

    /// Parse Open Graph data out of an HTML document.
    pub fn parse(html: &str) -> Option<Self> {
        if html.is_empty() {
            return None;
        }

        let doc = Html::parse_document(html);
        let meta_sel = Selector::parse("meta").ok()?;

        let mut og = OpenGraph::default();
        let mut non_og_description = None;

        for tag in doc.select(&meta_sel) {
            let property = tag.value().attr("property");
            let name = tag.value().attr("name");
            let content = tag.value().attr("content");

            if let (Some(property), Some(content)) = (property, content) {
                if let Some(rest) = property.strip_prefix("og:") {
                    og.insert(normalize_key(rest), content);
                } else if property.starts_with("twitter:") {
                    og.insert(normalize_key(property), content);
                } else if let Some(page_type) = og.values.get("type").cloned() {
                    // Type-scoped keys, e.g. `video:tag` on a page whose
                    // og:type is `video`. Only works when og:type is
                    // declared before its scoped values, as on real pages.
                    let prefix = format!("{page_type}:");
                    if let Some(rest) = property.strip_prefix(prefix.as_str()) {
                        og.insert(format!("{page_type}_{}", normalize_key(rest)), content);
                    }
                }
            }

            // Some publishers put og values in a `value` attribute.
            if let (Some(property), Some(value)) = (property, tag.value().attr("value")) {
                if let Some(rest) = property.strip_prefix("og:") {
                    og.values.insert(normalize_key(rest), value.to_string());
                }
            }

            if let (Some(name), Some(content)) = (name, content) {
                if name == "description" {
                    non_og_description = Some(content.to_string());
                } else if name.starts_with("twitter:") {
                    og.insert(normalize_key(name), content);
                }
            }
        }

        og.apply_fallbacks(&doc, non_og_description);

        if og.values.is_empty() {
            return None;
        }
        Some(og)
    }

    fn insert(&mut self, key: String, value: &str) {
        if self.values.contains_key(&key) {
            self.additional.entry(key).or_default().push(value.to_string());
        } else {
            self.values.insert(key, value.to_string());
        }
    }

    fn apply_fallbacks(&mut self, doc: &Html, non_og_description: Option<String>) {
        if !self.values.contains_key("title") {
            if let Ok(sel) = Selector::parse("title") {
                if let Some(title) = doc.select(&sel).next() {
                    let text: String = title.text().collect();
                    self.values.insert("title".to_string(), text);
                }
            }
        }

        if !self.values.contains_key("description") {
            if let Some(description) = non_og_description {
                self.values.insert("description".to_string(), description);
            }
        }

        if !self.values.contains_key("image") {
            if let Some(href) = Selector::parse(r#"link[rel="image_src"]"#)
                .ok()
                .and_then(|sel| doc.select(&sel).next())
                .and_then(|link| link.value().attr("href").map(str::to_string))
            {
                self.values.insert("image".to_string(), href.clone());
                self.values.insert("image_src".to_string(), href);
            } else if let Some(twitter_image) = self.values.get("twitter_image").cloned() {
                self.values.insert("image".to_string(), twitter_image);
            } else if let Ok(sel) = Selector::parse("img[width]") {
                // Last resort: the first reasonably large inline image.
                for img in doc.select(&sel) {
                    let width = img.value().attr("width").unwrap_or_default();
                    let large = width == "100%" || width.parse::<u32>().map(|w| w > 300).unwrap_or(false);
                    if large {
                        if let Some(src) = img.value().attr("src") {
                            self.values.insert("image".to_string(), src.to_string());
                        }
                        break;
                    }
                }
            }
        }
    }

    /// Explicit lookup of a normalized property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Extra values for properties that appeared more than once.
    pub fn additional(&self, key: &str) -> &[String] {
        self.additional.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// All discovered property keys, in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Base schema name for the page's `og:type`, if it maps to one.
    pub fn schema(&self) -> Option<&'static str> {
        let page_type = self.get("type")?;
        SCHEMA_TYPES
            .iter()
            .find(|(_, types)| types.contains(&page_type))
            .map(|(schema, _)| *schema)
    }

    /// Whether the page carries embedded location data.
    pub fn has_location(&self) -> bool {
        if self.values.contains_key("latitude") && self.values.contains_key("longitude") {
            return true;
        }
        ["street_address", "locality", "region", "postal_code", "country_name"]
            .iter()
            .all(|key| self.values.contains_key(*key))
    }
}
