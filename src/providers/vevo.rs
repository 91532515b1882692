//! VEVO music video embeds.
//!
//! Watch-page URLs (with or without artist/title slugs) map onto VEVO's
//! static embed page keyed by video id. The player is always rendered at
//! 640x360 inside a responsive container, ignoring whatever dimensions the
//! invocation supplied.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::descriptor::{EmbedDescriptor, EmbedType, EndpointSpec, Pattern, PatternSpec};
use crate::embedder::{make_responsive, render_iframe, EmbedItem, Provider};
use crate::host::{option_map, OptionMap};

const PATTERN: &str = r"https?://www\.vevo\.com/watch/(?:[^/]+/)?(?:[^/]+/)?(?P<video_id>\w+)";

static DESCRIPTOR: Lazy<EmbedDescriptor> = Lazy::new(|| EmbedDescriptor {
    embed_id: "vevo",
    name: "VEVO",
    embed_type: EmbedType::Iframe,
    pattern: PatternSpec::One(Pattern::case_insensitive(PATTERN)),
    endpoint: EndpointSpec::Template("https://scache.vevo.com/assets/html/embed.html?video={video_id}"),
    settings: vec![],
    use_cache: true,
    shortcode: None,
});

pub struct Vevo;

#[async_trait]
impl Provider for Vevo {
    fn descriptor(&self) -> &EmbedDescriptor {
        &DESCRIPTOR
    }

    fn customize(&self, item: &mut EmbedItem, defaults: &OptionMap) -> Option<String> {
        item.options = option_map([("width", "640"), ("height", "360")]);
        let iframe = render_iframe(&DESCRIPTOR, defaults, item);
        Some(make_responsive(DESCRIPTOR.embed_id, &iframe, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::first_match;

    #[test]
    fn extracts_video_id_with_and_without_slugs() {
        for url in [
            "https://www.vevo.com/watch/USUV71703085",
            "https://www.vevo.com/watch/taylor-swift/delicate/QM5FT1800102",
            "HTTPS://WWW.VEVO.COM/watch/artist/title/ABC123",
        ] {
            let m = first_match(&DESCRIPTOR.pattern, url).unwrap();
            assert!(m.named_value("video_id").is_some(), "{url}");
        }

        let m = first_match(
            &DESCRIPTOR.pattern,
            "https://www.vevo.com/watch/taylor-swift/delicate/QM5FT1800102",
        )
        .unwrap();
        assert_eq!(m.named_value("video_id"), Some("QM5FT1800102"));
    }

    #[test]
    fn renders_fixed_size_responsive_iframe() {
        let url = "https://www.vevo.com/watch/USUV71703085";
        let mut item = EmbedItem {
            url: url.to_string(),
            matches: first_match(&DESCRIPTOR.pattern, url).unwrap(),
            attrs: OptionMap::new(),
            raw_attrs: OptionMap::new(),
            options: option_map([("width", "1000"), ("height", "900")]),
            src: String::new(),
            styles: Default::default(),
        };
        item.src = crate::endpoint::resolve(&DESCRIPTOR.endpoint, &item.matches);

        let html = Vevo.customize(&mut item, &OptionMap::new()).unwrap();
        assert!(html.starts_with("<div class=\"responsive-embed-container\">"));
        assert!(html.contains("width='640'"));
        assert!(html.contains("height='360'"));
        assert!(html.contains("src='https://scache.vevo.com/assets/html/embed.html?video=USUV71703085'"));
    }
}
