//! `embedkit` CLI - Transform content and inspect providers

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use embedkit::registry::Registry;
use embedkit::{config, EmbedEnv, HttpClient, MemoryStore, NullFetcher, SystemClock};

#[derive(Parser)]
#[command(name = "embedkit")]
#[command(about = "Turn media URLs and shortcodes into embed markup")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.config/embedkit/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform content from a file (or stdin) and print the result
    Render {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,

        /// Content scope identifier, enables markup caching
        #[arg(short, long)]
        scope: Option<String>,

        /// Skip metadata lookups (no network)
        #[arg(long)]
        offline: bool,
    },

    /// Show which provider matches a URL and the source it resolves to
    Resolve {
        /// URL to resolve
        url: String,
    },

    /// List providers with their enabled state and patterns
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .compact()
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let store = config::ConfigFile::load(&config_path)?.into_store();

    match cli.command {
        Commands::Render { file, scope, offline } => {
            cmd_render(&store, file.as_deref(), scope, offline).await?;
        }
        Commands::Resolve { url } => {
            cmd_resolve(&store, &url);
        }
        Commands::Providers => {
            cmd_providers(&store);
        }
    }

    Ok(())
}

async fn cmd_render(
    store: &MemoryStore,
    file: Option<&std::path::Path>,
    scope: Option<String>,
    offline: bool,
) -> Result<()> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let registry = Registry::from_store(store);
    let output = if offline {
        let env = EmbedEnv { meta: store, http: &NullFetcher, clock: &SystemClock, scope };
        registry.transform_content(&content, &env).await
    } else {
        let http = HttpClient::new()?;
        let env = EmbedEnv { meta: store, http: &http, clock: &SystemClock, scope };
        registry.transform_content(&content, &env).await
    };

    print!("{output}");
    Ok(())
}

fn cmd_resolve(store: &MemoryStore, url: &str) {
    let registry = Registry::from_store(store);
    match registry.resolve_src(url) {
        Some((embed_id, src)) => {
            println!("provider: {embed_id}");
            println!("src: {src}");
        }
        None => {
            println!("no enabled provider matches {url}");
        }
    }
}

fn cmd_providers(store: &MemoryStore) {
    use embedkit::settings::{self, PROVIDERS_OPTION};
    use embedkit::OptionsStore;

    let enabled = store
        .get_option(PROVIDERS_OPTION)
        .unwrap_or_else(settings::default_providers);

    for provider in embedkit::providers::all() {
        let desc = provider.descriptor();
        let state = if enabled.get(desc.embed_id).map(String::as_str) == Some("on") {
            "enabled"
        } else {
            "disabled"
        };
        println!("{} ({}) - {state}", desc.embed_id, desc.name);
        for pattern in desc.pattern.patterns() {
            println!("    {}", pattern.regex);
        }
    }
}
