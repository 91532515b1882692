//! Bandcamp album/track/video embeds.
//!
//! Two invocation flows share one pipeline:
//!
//! - **Link-triggered**: a pasted `https://{band}.bandcamp.com/album/...`
//!   URL. The URL carries slugs, but the embedded player wants numeric
//!   ids, so `pre_embed` scrapes the page's Open Graph video URL and
//!   harvests `album=`/`track=` ids from it.
//! - **Shortcode-triggered**: `[bandcamp album=1234 ...]` supplies numeric
//!   ids directly; a synthetic URL is built so the same pattern and
//!   pipeline apply.
//!
//! The `layout` option (`standard`/`slim`/`artwork`/`video`) drives a
//! decision table over iframe height, CSS min/max bounds, tracklist
//! suppression, artwork size, and color parameters. The player endpoint
//! takes slash-separated `key=value` path segments; the video sub-mode
//! uses a different endpoint with a real query string.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::cache;
use crate::descriptor::{EmbedDescriptor, EmbedType, EndpointSpec, FieldKind, Pattern, PatternSpec, SettingField};
use crate::embedder::{EmbedEnv, EmbedItem, Provider};
use crate::host::OptionMap;
use crate::opengraph::OpenGraph;

const PATTERN: &str =
    r"https?://(?P<band_id>\w+)\.bandcamp\.com/?(?:album/(?P<album_id>[\w-]+))?(?:/?track/(?P<track_id>[\w-]+))?";

const ENDPOINT: &str =
    "https://bandcamp.com/EmbeddedPlayer/band={band_id}/album={album_id}/track={track_id}/";

static DESCRIPTOR: Lazy<EmbedDescriptor> = Lazy::new(|| EmbedDescriptor {
    embed_id: "bandcamp",
    name: "Bandcamp",
    embed_type: EmbedType::Iframe,
    pattern: PatternSpec::One(Pattern::new(PATTERN)),
    endpoint: EndpointSpec::Template(ENDPOINT),
    settings: vec![
        SettingField::new("layout", FieldKind::Radio, "Layout", "The layout of the embed.", "standard")
            .with_choices(&[("slim", "Slim"), ("artwork", "Artwork Only"), ("standard", "Standard")]),
        SettingField::new(
            "artwork",
            FieldKind::Radio,
            "Show Album Artwork",
            "Select a size if you want to show album artwork.",
            "small",
        )
        .with_choices(&[("big", "Big"), ("small", "Small"), ("none", "None")]),
        SettingField::new(
            "tracklist",
            FieldKind::Checkbox,
            "Show Tracklist",
            "If checked, the album tracklist will be displayed.",
            "",
        ),
        SettingField::new("bgcol", FieldKind::Radio, "Theme", "The color theme of the widget.", "#ffffff")
            .with_choices(&[("#ffffff", "Light"), ("#333333", "Dark")]),
        SettingField::new("linkcol", FieldKind::Color, "Link color", "Choose a link color.", "#0687F5"),
        SettingField::new("width", FieldKind::Number, "Width", "px (square)", "350").with_range(170, 700),
        SettingField::new("height", FieldKind::Number, "Height", "px", "470").with_range(312, 960),
    ],
    use_cache: true,
    shortcode: Some("bandcamp"),
});

pub struct Bandcamp;

impl Bandcamp {
    /// Expand `[bandcamp ...]` attributes into a synthetic URL plus the
    /// attribute set the pipeline runs with.
    ///
    /// The subdomain is a hash of the attributes: the URL acts as the item
    /// identity and cache key, so distinct shortcodes must not collide.
    /// Returns an explanatory message when none of `track`, `album`,
    /// `video` are present.
    pub fn shortcode_target(attrs: &OptionMap) -> Result<(String, OptionMap), String> {
        let numeric = |key: &str| attrs.get(key).filter(|v| is_numeric(v));

        let mut url = format!("https://{}.bandcamp.com/", cache::fingerprint("bandcamp-shortcode", attrs));

        if let Some(album) = numeric("album") {
            url.push_str(&format!("album/{album}/"));
        }

        if let Some(video) = numeric("video") {
            url.push_str(&format!("track/{video}/"));
        } else if let Some(track) = numeric("track") {
            url.push_str(&format!("track/{track}/"));
        }

        if !url.contains("album") && !url.contains("track") {
            return Err("[bandcamp: shortcode must include 'track', 'album', or 'video' param]".to_string());
        }

        let mut attrs = attrs.clone();
        if numeric("video").is_some() {
            attrs.insert("layout".to_string(), "video".to_string());
        } else if attrs.get("minimal").map(String::as_str) == Some("true") {
            attrs.insert("layout".to_string(), "artwork".to_string());
            attrs.remove("minimal");
        } else if attrs.get("size").map(String::as_str) == Some("small") {
            attrs.insert("layout".to_string(), "slim".to_string());
            attrs.remove("size");
        }
        attrs.insert("is_shortcode".to_string(), "true".to_string());

        Ok((url, attrs))
    }
}

#[async_trait]
impl Provider for Bandcamp {
    fn descriptor(&self) -> &EmbedDescriptor {
        &DESCRIPTOR
    }

    /// Replace slug captures with the numeric ids the player expects,
    /// scraped from the page's Open Graph video URL. Shortcodes already
    /// carry numeric ids and are left untouched; a failed lookup leaves
    /// the slug matches as-is.
    async fn pre_embed(&self, item: &mut EmbedItem, env: &EmbedEnv<'_>) {
        if item.attrs.contains_key("is_shortcode") {
            return;
        }

        let link = if item.matches.named_value("album_id").is_some()
            || item.matches.named_value("track_id").is_some()
        {
            item.url.clone()
        } else {
            item.matches.full.clone()
        };

        let Some(og) = OpenGraph::fetch(&link, env.http).await else { return };
        let Some(og_url) = og.get("video_secure_url").or_else(|| og.get("video")) else { return };

        // The player URL carries its parameters as path segments; turning
        // '/' into '&' lets a query-string parse extract them all.
        let as_query = og_url.replace('/', "&");
        for (key, value) in url::form_urlencoded::parse(as_query.as_bytes()) {
            match key.as_ref() {
                "album" if is_numeric(&value) => {
                    item.matches.named.insert("album_id".to_string(), value.to_string());
                }
                "track" if is_numeric(&value) => {
                    item.matches.named.insert("track_id".to_string(), value.to_string());
                }
                _ => {}
            }
        }
    }

    fn expand_shortcode(&self, attrs: &OptionMap) -> Result<(String, OptionMap), String> {
        Self::shortcode_target(attrs)
    }

    fn customize(&self, item: &mut EmbedItem, _defaults: &OptionMap) -> Option<String> {
        // Shortcode attributes are authoritative as-is; link embeds use
        // the merged invocation-over-saved view.
        let mut options = if item.attrs.contains_key("is_shortcode") {
            item.attrs.clone()
        } else {
            item.options.clone()
        };
        let mut params: Vec<(String, String)> = Vec::new();

        // 100% is not a valid iframe width attribute value.
        if options.get("width").map(String::as_str) == Some("100%") {
            item.styles.insert("width".to_string(), "100%".to_string());
        }

        let layout = options.get("layout").cloned().unwrap_or_default();
        let width: i64 = options.get("width").and_then(|w| w.parse().ok()).unwrap_or(350);

        match layout.as_str() {
            "video" => {
                // Endpoint is rewritten below; no sizing overrides here.
            }

            "slim" => {
                params.push(("size".to_string(), "small".to_string()));
                if options.get("artwork").map(String::as_str) == Some("none") {
                    params.push(("artwork".to_string(), "none".to_string()));
                }
                options.insert("height".to_string(), "42".to_string());
                item.styles.insert("min-width".to_string(), "170px".to_string());
                item.styles.insert("max-width".to_string(), "100%".to_string());
            }

            "artwork" => {
                params.push(("minimal".to_string(), "true".to_string()));
                params.push(("size".to_string(), "large".to_string()));
                // Artwork-only players are square.
                if let Some(w) = options.get("width").cloned() {
                    options.insert("height".to_string(), w);
                }
            }

            _ => {
                // Standard layout, also the fallback for unknown values.
                let tracklist_on = tracklist_enabled(&options, item.matches.named_value("album_id"));

                params.push(("size".to_string(), "large".to_string()));
                item.styles.insert("max-width".to_string(), "700px".to_string());

                if tracklist_on {
                    if options.get("artwork").map(String::as_str) == Some("big") {
                        let (lo, hi) = if width < 300 { (width + 172, width + 456) } else { (width + 152, width + 436) };
                        item.styles.insert("min-height".to_string(), format!("{lo}px"));
                        item.styles.insert("max-height".to_string(), format!("{hi}px"));
                    } else {
                        item.styles.insert("min-height".to_string(), "208px".to_string());
                        item.styles.insert("max-height".to_string(), "472px".to_string());
                    }
                } else {
                    params.push(("tracklist".to_string(), "false".to_string()));
                    let height = if width < 300 { width + 143 } else { width + 120 };
                    options.insert("height".to_string(), height.to_string());
                }

                match options.get("artwork").cloned() {
                    Some(artwork) if artwork != "big" => {
                        params.push(("artwork".to_string(), artwork.clone()));
                        if !tracklist_on {
                            options.insert("height".to_string(), "120".to_string());
                        }
                        // Anything narrower than 400px drops the artwork.
                        let min_width = if artwork == "small" { "400px" } else { "250px" };
                        item.styles.insert("min-width".to_string(), min_width.to_string());
                        let max_width = if width < 700 { "100%" } else { "700px" };
                        item.styles.insert("max-width".to_string(), max_width.to_string());
                    }
                    _ => {
                        item.styles.insert("min-width".to_string(), "170px".to_string());

                        // Merch package display; shortcode-only, big artwork only.
                        if let Some(package) = options.get("package").filter(|p| is_numeric(p)).cloned() {
                            params.push(("package".to_string(), package));
                            let height: i64 =
                                options.get("height").and_then(|h| h.parse().ok()).unwrap_or(470);
                            options.insert("height".to_string(), (height + 66).to_string());
                            item.styles.insert("min-height".to_string(), "348px".to_string());
                        }
                    }
                }
            }
        }

        // Color parameters travel without their '#'; any non-white
        // background also needs the transparency flag.
        if let Some(bgcol) = options.get("bgcol").and_then(|c| hex_color_no_hash(c)) {
            if bgcol != "ffffff" {
                params.push(("transparent".to_string(), "true".to_string()));
            }
            params.push(("bgcol".to_string(), bgcol));
        }
        if let Some(linkcol) = options.get("linkcol").and_then(|c| hex_color_no_hash(c)) {
            params.push(("linkcol".to_string(), linkcol));
        }

        params.retain(|(_, v)| !v.is_empty());

        item.src = build_src(&item.src, &item.matches.named, &layout, &params);
        item.options = options;

        None // Let the base iframe generator run on the mutated item.
    }
}

/// Whether the standard layout shows the tracklist. Off whenever the
/// option says so, the `notracklist` escape hatch is set, or there is no
/// numeric album id to list tracks for.
fn tracklist_enabled(options: &OptionMap, album_id: Option<&str>) -> bool {
    let value = options.get("tracklist").map(String::as_str).unwrap_or("");
    if value.is_empty() || value == "false" {
        return false;
    }
    if options.get("notracklist").map(String::as_str) == Some("true") {
        return false;
    }
    album_id.is_some_and(is_numeric)
}

/// Assemble the final player src.
///
/// The resolved template looks like
/// `https://bandcamp.com/EmbeddedPlayer/band=B/album=A/track=T/` with
/// empty segments where a capture did not participate. The player wants
/// neither the band id nor empty segments, and takes every parameter as a
/// `key=value/` path segment. The video player is a different endpoint
/// with a real query string and only the track id.
fn build_src(resolved: &str, named: &std::collections::BTreeMap<String, String>, layout: &str, params: &[(String, String)]) -> String {
    let band = named.get("band_id").map(String::as_str).unwrap_or_default();
    let album = named.get("album_id").map(String::as_str).unwrap_or_default();
    let track = named.get("track_id").map(String::as_str).unwrap_or_default();

    if layout == "video" {
        let mut src = resolved.replace("/EmbeddedPlayer/", "/VideoEmbed?");
        if !band.is_empty() {
            src = src.replace(&format!("band={band}/"), "");
        }
        src = src.replace(&format!("album={album}/"), "");
        for (key, value) in params {
            src.push_str(&format!("&{key}={value}"));
        }
        return src;
    }

    let mut src = resolved.to_string();
    if !band.is_empty() {
        src = src.replace(&format!("band={band}/"), "");
    }
    if album.is_empty() {
        src = src.replace("album=/", "");
    }
    if track.is_empty() {
        src = src.replace("track=/", "");
    }
    for (key, value) in params {
        src.push_str(&format!("{key}={value}/"));
    }
    src
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Strip a leading `#` and validate a 3- or 6-digit hex color.
fn hex_color_no_hash(value: &str) -> Option<String> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    let valid = (hex.len() == 3 || hex.len() == 6) && hex.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then(|| hex.to_string())
}
