//! Endpoint template resolution.
//!
//! Turns a matched URL into the provider's embeddable source by
//! substituting `{key}` placeholders with named capture values. This is
//! literal token replacement over the fixed vocabulary of capture names,
//! not a template engine. A spec that cannot be resolved (no template for
//! the matched scheme) falls back to the original matched URL so the
//! render never fails.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::descriptor::EndpointSpec;
use crate::matcher::MatchResult;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex"));

/// Substitute `{key}` placeholders in `template` from the match's named
/// captures. Missing keys substitute an empty string.
pub fn fill_template(template: &str, m: &MatchResult) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            m.named.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Resolve an endpoint spec against a pattern match.
///
/// Scheme-mapped specs use the scheme key the matcher reported; an
/// unknown or absent scheme falls back to the full matched URL.
pub fn resolve(endpoint: &EndpointSpec, m: &MatchResult) -> String {
    match endpoint.template_for(m.scheme.as_deref()) {
        Some(template) => fill_template(template, m),
        None => m.full.clone(),
    }
}

/// Append query arguments to a URL, respecting an existing query string.
/// Values are percent-encoded; keys are passed through as-is.
pub fn add_query_args(url: &str, args: &[(String, String)]) -> String {
    let mut out = url.to_string();
    for (key, value) in args {
        let sep = if out.contains('?') { '&' } else { '?' };
        out.push(sep);
        out.push_str(key);
        out.push('=');
        out.push_str(&urlencoding::encode(value));
    }
    out
}
