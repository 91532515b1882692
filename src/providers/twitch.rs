//! Twitch channel, video, and clip embeds via Twitch's oEmbed API.
//!
//! Pure registration provider: the host's oEmbed machinery does the
//! fetching, this module only supplies the pattern/endpoint pairing and
//! the responsive wrapper hint.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::descriptor::{EmbedDescriptor, EmbedType, EndpointSpec, Pattern, PatternSpec};
use crate::embedder::Provider;

static DESCRIPTOR: Lazy<EmbedDescriptor> = Lazy::new(|| EmbedDescriptor {
    embed_id: "twitch",
    name: "Twitch",
    embed_type: EmbedType::OEmbed,
    pattern: PatternSpec::One(Pattern::case_insensitive(r"https?://(clips\.|www\.)?twitch\.tv/.*")),
    endpoint: EndpointSpec::Template("https://api.twitch.tv/v4/oembed"),
    settings: vec![],
    use_cache: false,
    shortcode: None,
});

pub struct Twitch;

#[async_trait]
impl Provider for Twitch {
    fn descriptor(&self) -> &EmbedDescriptor {
        &DESCRIPTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::first_match;

    #[test]
    fn matches_channels_videos_and_clips() {
        for url in [
            "https://www.twitch.tv/monstercat",
            "https://twitch.tv/videos/181326702",
            "https://clips.twitch.tv/DaintyBlitheWolfRuleFive",
            "HTTPS://WWW.TWITCH.TV/MONSTERCAT",
        ] {
            assert!(first_match(&DESCRIPTOR.pattern, url).is_some(), "{url}");
        }
    }

    #[test]
    fn ignores_non_twitch_hosts() {
        assert!(first_match(&DESCRIPTOR.pattern, "https://nottwitch.tv/x").is_none());
        assert!(first_match(&DESCRIPTOR.pattern, "https://twitch.example/x").is_none());
    }
}
