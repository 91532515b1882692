//! End-to-end pipeline tests over the public API.
//!
//! Everything here runs against the in-memory store and a canned HTTP
//! fetcher, exercising the same path a host platform would: build a
//! registry from settings, hand it content, check the markup.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use embedkit::{Clock, EmbedEnv, EmbedError, HttpFetch, MemoryStore, NullFetcher, Registry};

struct FixedClock(AtomicU64);

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Canned fetcher: serves one HTML body for every URL and records what
/// was requested.
struct CannedFetcher {
    body: String,
    requests: Mutex<Vec<String>>,
}

impl CannedFetcher {
    fn new(body: &str) -> Self {
        Self { body: body.to_string(), requests: Mutex::new(Vec::new()) }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for CannedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, EmbedError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self.body.clone())
    }
}

fn offline_env<'a>(store: &'a MemoryStore, scope: &str) -> EmbedEnv<'a> {
    EmbedEnv {
        meta: store,
        http: &NullFetcher,
        clock: &embedkit::SystemClock,
        scope: Some(scope.to_string()),
    }
}

const BANDCAMP_ALBUM_PAGE: &str = r#"<html><head>
    <meta property="og:title" content="My Album, by Artist">
    <meta property="og:video:secure_url"
          content="https://bandcamp.com/EmbeddedPlayer/v=2/album=1218256177/size=large/tracklist=false/artwork=small/">
    </head><body></body></html>"#;

#[tokio::test]
async fn bandcamp_link_resolves_slug_to_numeric_album_id() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);
    let fetcher = CannedFetcher::new(BANDCAMP_ALBUM_PAGE);
    let env = EmbedEnv {
        meta: &store,
        http: &fetcher,
        clock: &embedkit::SystemClock,
        scope: None,
    };

    let out = registry
        .transform_content("https://artist.bandcamp.com/album/my-album", &env)
        .await;

    // The page was consulted and the numeric id from its player URL won.
    assert_eq!(fetcher.requests(), ["https://artist.bandcamp.com/album/my-album"]);
    assert!(out.contains("album=1218256177"));
    assert!(!out.contains("album=my-album"));
    assert!(out.contains("<!-- Starting bandcamp iframe embed"));
}

#[tokio::test]
async fn bandcamp_metadata_failure_degrades_to_slug() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content(
            "https://artist.bandcamp.com/album/my-album",
            &offline_env(&store, "post-1"),
        )
        .await;

    // Slug album id means no tracklist, but the embed still renders.
    assert!(out.contains("album=my-album"));
    assert!(out.contains("tracklist=false"));
    assert!(out.contains("<iframe"));
}

#[tokio::test]
async fn bandcamp_shortcode_with_track_only() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content("[bandcamp track=4155073286]", &offline_env(&store, "post-1"))
        .await;

    assert!(out.contains("track=4155073286"));
    assert!(out.contains("size=large"));
    assert!(!out.contains("album="));
}

#[tokio::test]
async fn bandcamp_slim_shortcode_height_is_42() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content(
            "[bandcamp track=4155073286 size=small]",
            &offline_env(&store, "post-1"),
        )
        .await;

    assert!(out.contains("height='42'"));
    assert!(out.contains("size=small"));
    assert!(!out.contains("tracklist"));
}

#[tokio::test]
async fn standard_layout_carries_size_large_and_width_cap() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content("[bandcamp album=1218256177]", &offline_env(&store, "post-1"))
        .await;

    assert!(out.contains("size=large"));
    assert!(out.contains("max-width:700px;"));
}

#[tokio::test]
async fn box_url_with_unknown_query_keys_drops_them() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content(
            "https://app.box.com/s/abc123?view=icon&utm_source=mail",
            &offline_env(&store, "post-1"),
        )
        .await;

    assert!(out.contains("view=icon"));
    assert!(!out.contains("utm_source"));
    assert!(out.contains("embed_widget/s/abc123"));
}

#[tokio::test]
async fn duplicate_urls_in_one_render_resolve_identically() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let content = "https://app.box.com/s/abc123\nhttps://app.box.com/s/abc123";
    let out = registry.transform_content(content, &offline_env(&store, "post-1")).await;

    let lines: Vec<&str> = out.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
    assert!(lines[0].contains("embed_widget/s/abc123"));
}

#[tokio::test]
async fn cached_markup_is_returned_verbatim() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let content = "https://app.box.com/s/abc123";
    let first = registry.transform_content(content, &offline_env(&store, "post-1")).await;
    let second = registry.transform_content(content, &offline_env(&store, "post-1")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn cache_expires_after_a_week_plus_jitter() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);
    let clock = FixedClock(AtomicU64::new(1_000_000));
    let fetcher = CannedFetcher::new(BANDCAMP_ALBUM_PAGE);

    let content = "https://artist.bandcamp.com/album/my-album";
    let env = EmbedEnv {
        meta: &store,
        http: &fetcher,
        clock: &clock,
        scope: Some("post-1".to_string()),
    };

    let first = registry.transform_content(content, &env).await;
    let again = registry.transform_content(content, &env).await;
    // Second pass is a cache hit: no new metadata fetch.
    assert_eq!(first, again);
    assert_eq!(fetcher.requests().len(), 1);

    // Jitter tops out at one day past the nominal week.
    clock.0.fetch_add(8 * 24 * 60 * 60 + 1, Ordering::SeqCst);
    let _ = registry.transform_content(content, &env).await;
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn scopes_do_not_share_cache_entries() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);
    let fetcher = CannedFetcher::new(BANDCAMP_ALBUM_PAGE);
    let clock = FixedClock(AtomicU64::new(1_000_000));

    let content = "https://artist.bandcamp.com/album/my-album";
    for scope in ["post-1", "post-2"] {
        let env = EmbedEnv {
            meta: &store,
            http: &fetcher,
            clock: &clock,
            scope: Some(scope.to_string()),
        };
        let _ = registry.transform_content(content, &env).await;
    }
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn vevo_renders_responsive_fixed_size_player() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content(
            "https://www.vevo.com/watch/artist/title/USUV71703085",
            &offline_env(&store, "post-1"),
        )
        .await;

    assert!(out.contains(r#"<div class="responsive-embed-container">"#));
    assert!(out.contains("width='640'"));
    assert!(out.contains("height='360'"));
    assert!(out.contains("video=USUV71703085"));
}

#[tokio::test]
async fn mixed_content_transforms_each_piece_in_place() {
    let store = MemoryStore::new();
    let registry = Registry::from_store(&store);

    let content = "intro\nhttps://app.box.com/s/abc123\nmiddle [bandcamp track=99] end\nhttps://example.com/plain\n";
    let out = registry.transform_content(content, &offline_env(&store, "post-1")).await;

    let lines: Vec<&str> = out.split('\n').collect();
    assert_eq!(lines[0], "intro");
    assert!(lines[1].contains("embed_widget/s/abc123"));
    assert!(lines[2].starts_with("middle <!-- Starting bandcamp"));
    assert!(lines[2].ends_with(" end"));
    assert_eq!(lines[3], "https://example.com/plain");
}

#[tokio::test]
async fn custom_settings_flow_into_markup() {
    let config = embedkit::config::ConfigFile::parse(
        r#"
[options.box]
view = "icon"
theme = "gray"
"#,
    )
    .unwrap();
    let store = config.into_store();
    let registry = Registry::from_store(&store);

    let out = registry
        .transform_content("https://app.box.com/s/abc123", &offline_env(&store, "post-1"))
        .await;

    assert!(out.contains("view=icon"));
    assert!(out.contains("theme=gray"));
}
