//! Provider descriptors.
//!
//! A descriptor is the immutable configuration of one embed provider: how
//! its URLs look, which endpoint turns a match into an embeddable source,
//! which settings the admin UI exposes, and how the rendered markup is
//! dispatched (iframe vs. delegation to the host's oEmbed pipeline).

use crate::host::OptionMap;

/// Dispatch path for a provider's markup generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedType {
    /// Render a generic iframe around the resolved source URL.
    Iframe,
    /// Register with the host's oEmbed provider whitelist; the host
    /// fetches and caches the markup itself.
    OEmbed,
    /// Markup is produced by a provider script the host enqueues.
    Javascript,
    /// Plain link passthrough with a fallback message.
    Default,
}

/// One URL-matching pattern.
///
/// Capture groups that feed the endpoint template must be named
/// (`(?P<key>...)`). Case-insensitivity is declared per pattern, not
/// globally, because providers differ.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: &'static str,
    pub case_insensitive: bool,
    /// Endpoint scheme key, for providers whose URL shapes map to
    /// different endpoint templates.
    pub scheme: Option<&'static str>,
}

impl Pattern {
    pub const fn new(regex: &'static str) -> Self {
        Self { regex, case_insensitive: false, scheme: None }
    }

    pub const fn case_insensitive(regex: &'static str) -> Self {
        Self { regex, case_insensitive: true, scheme: None }
    }

    pub const fn with_scheme(regex: &'static str, scheme: &'static str) -> Self {
        Self { regex, case_insensitive: true, scheme: Some(scheme) }
    }
}

/// The pattern surface of a provider: a single pattern, ordered
/// alternatives, or an ordered pattern-to-scheme mapping (schemes carried
/// on the individual [`Pattern`]s).
#[derive(Debug, Clone)]
pub enum PatternSpec {
    One(Pattern),
    Any(Vec<Pattern>),
}

impl PatternSpec {
    /// All patterns in declaration order.
    pub fn patterns(&self) -> &[Pattern] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Any(ps) => ps,
        }
    }
}

/// Endpoint template(s) with `{key}` placeholders.
#[derive(Debug, Clone)]
pub enum EndpointSpec {
    /// One template shared by every pattern.
    Template(&'static str),
    /// Scheme key to template, selected via the matched pattern's scheme.
    ByScheme(Vec<(&'static str, &'static str)>),
}

impl EndpointSpec {
    /// Look up the template for a scheme key.
    pub fn template_for(&self, scheme: Option<&str>) -> Option<&'static str> {
        match self {
            Self::Template(t) => Some(t),
            Self::ByScheme(map) => {
                let scheme = scheme?;
                map.iter().find(|(k, _)| *k == scheme).map(|(_, t)| *t)
            }
        }
    }
}

/// Field widget type for a provider setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Checkbox,
    Radio,
    Select,
    Number,
    Color,
}

/// One admin-exposed tuning knob.
#[derive(Debug, Clone)]
pub struct SettingField {
    pub id: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub description: &'static str,
    pub default: &'static str,
    /// `(value, label)` pairs for radio/select fields.
    pub choices: Vec<(&'static str, &'static str)>,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl SettingField {
    pub fn new(id: &'static str, kind: FieldKind, label: &'static str, description: &'static str, default: &'static str) -> Self {
        Self { id, kind, label, description, default, choices: Vec::new(), min: None, max: None }
    }

    pub fn with_choices(mut self, choices: &[(&'static str, &'static str)]) -> Self {
        self.choices = choices.to_vec();
        self
    }

    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Immutable configuration for one embed provider.
#[derive(Debug, Clone)]
pub struct EmbedDescriptor {
    /// Unique lowercase identifier, e.g. `bandcamp`.
    pub embed_id: &'static str,
    /// Display name used in the admin UI, e.g. `Box.com`.
    pub name: &'static str,
    pub embed_type: EmbedType,
    pub pattern: PatternSpec,
    pub endpoint: EndpointSpec,
    /// Ordered settings schema; empty for providers with no knobs.
    pub settings: Vec<SettingField>,
    /// Whether rendered markup may be cached per content scope.
    pub use_cache: bool,
    /// Explicit shortcode trigger token, if the provider supports one.
    pub shortcode: Option<&'static str>,
}

impl EmbedDescriptor {
    /// Defaults derived from the settings schema, keyed by field id.
    pub fn default_options(&self) -> OptionMap {
        self.settings
            .iter()
            .map(|field| (field.id.to_string(), field.default.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_follow_schema() {
        let desc = EmbedDescriptor {
            embed_id: "demo",
            name: "Demo",
            embed_type: EmbedType::Iframe,
            pattern: PatternSpec::One(Pattern::new("x")),
            endpoint: EndpointSpec::Template("https://example.com/{id}"),
            settings: vec![
                SettingField::new("width", FieldKind::Number, "Width", "px", "550"),
                SettingField::new("theme", FieldKind::Radio, "Theme", "", "blue"),
            ],
            use_cache: false,
            shortcode: None,
        };
        let defaults = desc.default_options();
        assert_eq!(defaults.get("width").map(String::as_str), Some("550"));
        assert_eq!(defaults.get("theme").map(String::as_str), Some("blue"));
    }

    #[test]
    fn scheme_lookup() {
        let spec = EndpointSpec::ByScheme(vec![
            ("video", "https://example.com/video/"),
            ("post", "https://example.com/post/"),
        ]);
        assert_eq!(spec.template_for(Some("post")), Some("https://example.com/post/"));
        assert_eq!(spec.template_for(Some("unknown")), None);
        assert_eq!(spec.template_for(None), None);
    }

    #[test]
    fn single_template_ignores_scheme() {
        let spec = EndpointSpec::Template("https://example.com/");
        assert_eq!(spec.template_for(None), Some("https://example.com/"));
        assert_eq!(spec.template_for(Some("anything")), Some("https://example.com/"));
    }
}
