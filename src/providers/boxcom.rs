//! Box.com file and folder widget embeds.
//!
//! Shared-link URLs (`/s/{id}`, plain `/files/0/f/{id}`, and links already
//! pointing at `/embed/preview/` or `/embed_widget/`) all normalize to the
//! `/embed_widget/` endpoint on the same subdomain. Widget display options
//! come from the saved settings, but a query string on the pasted URL wins
//! for any key the settings schema knows about; unknown keys are dropped.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use url::Url;

use crate::descriptor::{EmbedDescriptor, EmbedType, EndpointSpec, FieldKind, Pattern, PatternSpec, SettingField};
use crate::embedder::{EmbedItem, Provider};
use crate::endpoint::add_query_args;
use crate::host::{merge_options, OptionMap};

const PATTERN: &str =
    r"https?://(?P<subdomain>\w+\.)?(?P<domain>\w+)\.box\.com/(?:embed/preview/|embed_widget/)?(?P<prefix>s|files/0/f)/(?P<id>\w+)";

const ENDPOINT: &str = "https://{subdomain}{domain}.box.com/embed_widget/{prefix}/{id}";

static DESCRIPTOR: Lazy<EmbedDescriptor> = Lazy::new(|| EmbedDescriptor {
    embed_id: "box",
    name: "Box",
    embed_type: EmbedType::Iframe,
    pattern: PatternSpec::One(Pattern::new(PATTERN)),
    endpoint: EndpointSpec::Template(ENDPOINT),
    settings: vec![
        SettingField::new("width", FieldKind::Number, "Width", "px", "550").with_range(200, 800),
        SettingField::new("height", FieldKind::Number, "Height", "px", "400").with_range(200, 800),
        SettingField::new("view", FieldKind::Select, "View", "How to display the folder contents.", "list")
            .with_choices(&[("list", "List"), ("icon", "Icon")]),
        SettingField::new("sort", FieldKind::Select, "Sort By", "Sort order for folder contents.", "date")
            .with_choices(&[("date", "Date"), ("name", "Name"), ("size", "Size")]),
        SettingField::new("direction", FieldKind::Select, "Sort Direction", "", "asc")
            .with_choices(&[("asc", "Ascending"), ("desc", "Descending")]),
        SettingField::new("theme", FieldKind::Select, "Theme", "Widget color theme.", "blue")
            .with_choices(&[("blue", "Blue"), ("gray", "Gray")]),
        SettingField::new(
            "show_parent_path",
            FieldKind::Checkbox,
            "Show Folder Path",
            "Show the folder path in the widget header.",
            "on",
        ),
        SettingField::new(
            "show_item_feed_action",
            FieldKind::Checkbox,
            "Show Item Actions",
            "Show sharing actions on each item.",
            "on",
        ),
        SettingField::new(
            "view_file_only",
            FieldKind::Checkbox,
            "Hide Sidebar",
            "Show only the file preview, without the sidebar.",
            "",
        ),
    ],
    use_cache: true,
    shortcode: None,
});

pub struct BoxCom;

#[async_trait]
impl Provider for BoxCom {
    fn descriptor(&self) -> &EmbedDescriptor {
        &DESCRIPTOR
    }

    fn customize(&self, item: &mut EmbedItem, _defaults: &OptionMap) -> Option<String> {
        // Per-link query keys override the saved settings; anything the
        // schema does not name is dropped rather than forwarded.
        let defaults = item.options.clone();
        let mut custom = OptionMap::new();
        if let Ok(parsed) = Url::parse(&item.url) {
            for (key, value) in parsed.query_pairs() {
                if defaults.contains_key(key.as_ref()) {
                    custom.insert(key.to_string(), value.to_string());
                }
            }
        }

        let merged = merge_options(&custom, &defaults);
        let args: Vec<(String, String)> = merged
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        item.src = add_query_args(&item.src, &args);
        item.options = merged;

        None
    }
}
