//! `embedkit` - URL-to-embed transformation pipeline
//!
//! Turns recognized media URLs and shortcodes inside a block of content
//! into ready-to-serve embed markup. Five providers ship in the box:
//! Bandcamp, Box, Twitch, VEVO, and Facebook.
//!
//! # Pipeline
//!
//! - **Matching**: provider URL patterns with named captures
//! - **Resolution**: endpoint templates turn captures into player URLs
//! - **Customization**: per-provider sizing, theming, and parameters
//! - **Caching**: rendered markup cached per content scope with a
//!   jittered week-long TTL
//!
//! Storage, time, and HTTP are abstracted behind narrow traits in
//! [`host`] and [`http`] so the pipeline embeds into any host platform.
//!
//! # Example
//!
//! ```rust,no_run
//! use embedkit::{EmbedEnv, HttpClient, MemoryStore, Registry, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new();
//!     let registry = Registry::from_store(&store);
//!     let http = HttpClient::new()?;
//!     let env = EmbedEnv {
//!         meta: &store,
//!         http: &http,
//!         clock: &SystemClock,
//!         scope: Some("post-1".to_string()),
//!     };
//!     let html = registry
//!         .transform_content("https://app.box.com/s/abc123", &env)
//!         .await;
//!     println!("{html}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod embedder;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod http;
pub mod matcher;
pub mod opengraph;
pub mod providers;
pub mod registry;
pub mod settings;
pub mod shortcode;

pub use descriptor::{EmbedDescriptor, EmbedType, FieldKind, SettingField};
pub use embedder::{EmbedEnv, EmbedItem, Embedder, OEmbedData, OEmbedRegistration, Provider};
pub use error::EmbedError;
pub use host::{merge_options, option_map, Clock, MemoryStore, MetaStore, OptionMap, OptionsStore, SystemClock};
pub use http::{HttpClient, HttpFetch, NullFetcher};
pub use opengraph::OpenGraph;
pub use registry::Registry;

/// Version of embedkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
