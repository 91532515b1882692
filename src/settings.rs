//! Saved settings: bootstrap, admin tab layout, and submission
//! sanitization.
//!
//! Two kinds of option records live in the host store: the provider
//! toggle map (which providers are enabled) and one option map per
//! provider holding its tuning knobs. First run installs shipped
//! defaults; subsequent runs self-heal by re-installing any record that
//! went missing without touching records that exist.

use tracing::info;

use crate::descriptor::{EmbedDescriptor, FieldKind};
use crate::host::{merge_options, option_map, OptionMap, OptionsStore};
use crate::providers;

/// Store key for the provider enable/disable map.
pub const PROVIDERS_OPTION: &str = "embedkit-providers";

/// Store key for one provider's option map.
pub fn option_key(embed_id: &str) -> String {
    format!("embedkit-{embed_id}")
}

/// Shipped provider toggles. Facebook starts off.
pub fn default_providers() -> OptionMap {
    option_map([
        ("bandcamp", "on"),
        ("box", "on"),
        ("twitch", "on"),
        ("vevo", "on"),
        ("facebook", ""),
    ])
}

/// Shipped per-provider options where they differ from the schema
/// defaults. Bandcamp ships with big artwork even though the schema
/// default for fresh admin submissions is small.
pub fn default_options(desc: &EmbedDescriptor) -> OptionMap {
    let schema = desc.default_options();
    match desc.embed_id {
        "bandcamp" => merge_options(&option_map([("artwork", "big")]), &schema),
        _ => schema,
    }
}

/// Whether every expected record exists in the store.
pub fn is_installed(store: &dyn OptionsStore) -> bool {
    if store.get_option(PROVIDERS_OPTION).is_none() {
        return false;
    }
    providers::all().iter().all(|provider| {
        let desc = provider.descriptor();
        desc.settings.is_empty() || store.get_option(&option_key(desc.embed_id)).is_some()
    })
}

/// Install any missing record with its shipped defaults. Existing records
/// are left untouched, so a partially wiped store heals without losing
/// the surviving configuration.
pub fn ensure_installed(store: &dyn OptionsStore) {
    if store.get_option(PROVIDERS_OPTION).is_none() {
        info!("installing default provider toggles");
        store.set_option(PROVIDERS_OPTION, default_providers());
    }

    for provider in providers::all() {
        let desc = provider.descriptor();
        if desc.settings.is_empty() {
            continue;
        }
        let key = option_key(desc.embed_id);
        if store.get_option(&key).is_none() {
            info!(embed_id = desc.embed_id, "installing default provider options");
            store.set_option(&key, default_options(desc));
        }
    }
}

/// Remove every record this crate owns.
pub fn uninstall(store: &dyn OptionsStore) {
    store.delete_option(PROVIDERS_OPTION);
    for provider in providers::all() {
        store.delete_option(&option_key(provider.descriptor().embed_id));
    }
}

/// One admin settings tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsTab {
    /// Tab slug; `providers` for the toggle tab, the embed id otherwise.
    pub id: String,
    pub title: String,
}

/// Tab layout: the provider toggle tab first, then one tab per enabled
/// provider that actually has settings.
pub fn admin_tabs(store: &dyn OptionsStore) -> Vec<SettingsTab> {
    let enabled = store.get_option(PROVIDERS_OPTION).unwrap_or_else(default_providers);

    let mut tabs = vec![SettingsTab { id: "providers".to_string(), title: "Providers".to_string() }];
    for provider in providers::all() {
        let desc = provider.descriptor();
        let on = enabled.get(desc.embed_id).map(String::as_str) == Some("on");
        if on && !desc.settings.is_empty() {
            tabs.push(SettingsTab { id: desc.embed_id.to_string(), title: desc.name.to_string() });
        }
    }
    tabs
}

/// Sanitize one provider's settings submission field by field.
///
/// Unchecked checkboxes arrive absent and store as empty; any other
/// field falls back to its previously stored value when the submitted
/// value is absent or invalid for the widget (unknown choice,
/// out-of-range or non-numeric number, malformed color), and to the
/// schema default when nothing was stored. A bad field never rejects
/// the rest of the submission. Unknown submitted keys are dropped.
pub fn sanitize_submission(desc: &EmbedDescriptor, submitted: &OptionMap, current: &OptionMap) -> OptionMap {
    let mut clean = OptionMap::new();

    for field in &desc.settings {
        let value = submitted.get(field.id).map(String::as_str);
        let fallback = current.get(field.id).map(String::as_str).unwrap_or(field.default);
        let sanitized = match field.kind {
            FieldKind::Checkbox => match value {
                Some("on") => "on".to_string(),
                _ => String::new(),
            },
            FieldKind::Radio | FieldKind::Select => value
                .filter(|v| field.choices.iter().any(|(choice, _)| choice == v))
                .unwrap_or(fallback)
                .to_string(),
            FieldKind::Number => value
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|n| field.min.map_or(true, |min| *n >= min) && field.max.map_or(true, |max| *n <= max))
                .map(|n| n.to_string())
                .unwrap_or_else(|| fallback.to_string()),
            FieldKind::Color => value
                .filter(|v| {
                    let hex = v.strip_prefix('#').unwrap_or(v);
                    (hex.len() == 3 || hex.len() == 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
                })
                .unwrap_or(fallback)
                .to_string(),
        };
        clean.insert(field.id.to_string(), sanitized);
    }

    clean
}

/// Sanitize the provider toggle submission: known ids only, checkbox
/// semantics.
pub fn sanitize_providers(submitted: &OptionMap) -> OptionMap {
    default_providers()
        .keys()
        .map(|id| {
            let on = submitted.get(id).map(String::as_str) == Some("on");
            (id.clone(), if on { "on" } else { "" }.to_string())
        })
        .collect()
}
