//! `[tag key=value ...]` shortcode scanning.
//!
//! Minimal single-tag parser: finds occurrences of one registered tag in
//! a body of text and hands back their attribute maps and byte ranges so
//! the caller can splice replacements in. Attribute values may be
//! double-quoted, single-quoted, or bare; attribute names are lowercased.
//! Nesting and closing tags are not supported, matching how the embed
//! shortcodes are actually written.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::host::OptionMap;

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<name>[A-Za-z_][\w-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s\]]+))"#)
        .expect("attribute regex")
});

/// One shortcode occurrence in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeMatch {
    pub attrs: OptionMap,
    /// Byte range of the full `[...]` token in the scanned text.
    pub range: (usize, usize),
}

/// Find every `[tag ...]` occurrence of `tag` in `text`, in order.
pub fn find_shortcodes(tag: &str, text: &str) -> Vec<ShortcodeMatch> {
    let Ok(open) = Regex::new(&format!(r"\[{}(?P<body>[^\]]*)\]", regex::escape(tag))) else {
        return Vec::new();
    };

    open.captures_iter(text)
        .filter_map(|caps| {
            let body = caps.name("body")?.as_str();
            // Require a word boundary so [bandcamp_x] does not trigger
            // [bandcamp].
            if body.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '-') {
                return None;
            }
            let whole = caps.get(0)?;
            Some(ShortcodeMatch {
                attrs: parse_attrs(body),
                range: (whole.start(), whole.end()),
            })
        })
        .collect()
}

/// Parse a shortcode attribute body into a map. Later duplicates win.
pub fn parse_attrs(body: &str) -> OptionMap {
    let mut attrs = OptionMap::new();
    for caps in ATTR.captures_iter(body) {
        let name = caps.name("name").map(|m| m.as_str().to_lowercase());
        let value = caps
            .name("dq")
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str().to_string());
        if let (Some(name), Some(value)) = (name, value) {
            attrs.insert(name, value);
        }
    }
    attrs
}
