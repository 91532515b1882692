//! URL pattern matching.
//!
//! Scans text against a provider's [`PatternSpec`] and extracts named
//! capture groups. Unnamed groups are excluded from the named map but kept
//! positionally for fallback. No match yields an empty list, never an
//! error; a pattern that fails to compile is logged and skipped so a bad
//! descriptor can never abort a render.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::descriptor::{Pattern, PatternSpec};

/// One pattern match within a block of text.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The full matched substring.
    pub full: String,
    /// Named capture group values, only for groups that participated.
    pub named: BTreeMap<String, String>,
    /// All capture groups by position, index 0 being the full match.
    pub positional: Vec<Option<String>>,
    /// Scheme key of the pattern that matched, if the spec declared one.
    pub scheme: Option<String>,
    /// Byte range of the match within the scanned text.
    pub range: (usize, usize),
}

impl MatchResult {
    /// Named capture value, or `None` if the group is absent or empty.
    pub fn named_value(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Compile one pattern, honoring its case-insensitivity flag.
pub(crate) fn compile(pattern: &Pattern) -> Option<Regex> {
    match RegexBuilder::new(pattern.regex)
        .case_insensitive(pattern.case_insensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = pattern.regex, error = %e, "skipping uncompilable pattern");
            None
        }
    }
}

fn capture_to_result(re: &Regex, caps: &regex::Captures<'_>, scheme: Option<&str>) -> MatchResult {
    let full = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
    let range = caps
        .get(0)
        .map(|m| (m.start(), m.end()))
        .unwrap_or((0, 0));

    let mut named = BTreeMap::new();
    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            named.insert(name.to_string(), m.as_str().to_string());
        }
    }

    let positional = (0..caps.len())
        .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
        .collect();

    MatchResult {
        full,
        named,
        positional,
        scheme: scheme.map(str::to_string),
        range,
    }
}

/// Find all matches of a pattern spec within `text`.
///
/// Patterns are scanned in declaration order; the first pattern that
/// matches anywhere wins and supplies every returned match. This keeps
/// scheme selection unambiguous when several alternatives could overlap.
pub fn find_matches(spec: &PatternSpec, text: &str) -> Vec<MatchResult> {
    for pattern in spec.patterns() {
        let Some(re) = compile(pattern) else { continue };
        let matches: Vec<MatchResult> = re
            .captures_iter(text)
            .map(|caps| capture_to_result(&re, &caps, pattern.scheme))
            .collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

/// First match of a pattern spec within `text`, if any.
pub fn first_match(spec: &PatternSpec, text: &str) -> Option<MatchResult> {
    find_matches(spec, text).into_iter().next()
}
