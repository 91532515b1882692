//! Facebook video and post embeds via Facebook's public oEmbed endpoints.
//!
//! Facebook content comes in many URL shapes; each pattern carries a
//! scheme tag (`video` or `post`) that selects between the two oEmbed
//! endpoints. Disabled by default: Facebook's endpoints are rate-limited
//! and most sites rely on the host's built-in support instead.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::descriptor::{EmbedDescriptor, EmbedType, EndpointSpec, Pattern, PatternSpec};
use crate::embedder::Provider;

const VIDEO_ENDPOINT: &str = "https://www.facebook.com/plugins/video/oembed.json/";
const POST_ENDPOINT: &str = "https://www.facebook.com/plugins/post/oembed.json/";

static DESCRIPTOR: Lazy<EmbedDescriptor> = Lazy::new(|| EmbedDescriptor {
    embed_id: "facebook",
    name: "Facebook",
    embed_type: EmbedType::OEmbed,
    pattern: PatternSpec::Any(vec![
        Pattern::with_scheme(r"https?://www\.facebook\.com/video\.php.*", "video"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/.*/videos/.*", "video"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/watch/?\?v=.*", "video"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/\w+/posts/.*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/\w+/activity/.*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/photo(s/|\.php).*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/permalink\.php.*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/media/.*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/questions/.*", "post"),
        Pattern::with_scheme(r"https?://www\.facebook\.com/notes/.*", "post"),
    ]),
    endpoint: EndpointSpec::ByScheme(vec![("video", VIDEO_ENDPOINT), ("post", POST_ENDPOINT)]),
    settings: vec![],
    use_cache: false,
    shortcode: None,
});

pub struct Facebook;

#[async_trait]
impl Provider for Facebook {
    fn descriptor(&self) -> &EmbedDescriptor {
        &DESCRIPTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::first_match;

    #[test]
    fn video_urls_report_the_video_scheme() {
        for url in [
            "https://www.facebook.com/video.php?v=123",
            "https://www.facebook.com/somepage/videos/456/",
            "https://www.facebook.com/watch/?v=789",
        ] {
            let m = first_match(&DESCRIPTOR.pattern, url).unwrap();
            assert_eq!(m.scheme.as_deref(), Some("video"), "{url}");
            assert_eq!(DESCRIPTOR.endpoint.template_for(m.scheme.as_deref()), Some(VIDEO_ENDPOINT));
        }
    }

    #[test]
    fn post_urls_report_the_post_scheme() {
        for url in [
            "https://www.facebook.com/someone/posts/12345",
            "https://www.facebook.com/someone/activity/678",
            "https://www.facebook.com/photo.php?fbid=9",
            "https://www.facebook.com/photos/9/",
            "https://www.facebook.com/permalink.php?story_fbid=1",
            "https://www.facebook.com/media/set/?set=a.1",
            "https://www.facebook.com/notes/someone/title/1",
        ] {
            let m = first_match(&DESCRIPTOR.pattern, url).unwrap();
            assert_eq!(m.scheme.as_deref(), Some("post"), "{url}");
            assert_eq!(DESCRIPTOR.endpoint.template_for(m.scheme.as_deref()), Some(POST_ENDPOINT));
        }
    }

    #[test]
    fn profile_urls_do_not_match() {
        assert!(first_match(&DESCRIPTOR.pattern, "https://www.facebook.com/someone").is_none());
    }
}
