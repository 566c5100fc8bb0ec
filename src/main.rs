use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use live_tv::{
    catalog::{CatalogSource, CatalogStore, DemoCatalogSource, PreferenceStore},
    config::Config,
    ingestor::CatalogAssembler,
    relay::StreamResolver,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "live-tv")]
#[command(version = "0.1.0")]
#[command(about = "Live TV catalog service with stream relay")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Serve the generated demo catalog instead of fetching playlists
    #[arg(long)]
    demo: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("live_tv={},tower_http=trace", cli.log_level)
    } else {
        format!("live_tv={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Live TV Service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if cli.demo {
        config.catalog.demo_mode = true;
    }

    let source: Arc<dyn CatalogSource> = if config.catalog.demo_mode {
        info!("Demo mode enabled, serving generated catalog");
        Arc::new(DemoCatalogSource::new(config.catalog.viewer_seed))
    } else {
        let assembler = CatalogAssembler::from_config(&config.catalog)?;
        info!(
            "Catalog assembler initialized with {} playlist sources",
            assembler.sources().len()
        );
        Arc::new(assembler)
    };

    let catalog = CatalogStore::new(source);
    let preferences = PreferenceStore::new(config.preferences.clone());
    let resolver = StreamResolver::from_config(&config.relay)?;
    info!("Stream relay mounted at {}", resolver.relay_path());

    if config.catalog.refresh_on_startup {
        let catalog = catalog.clone();
        tokio::spawn(async move {
            let outcome = catalog.refresh().await;
            match outcome.error {
                Some(error) => warn!("Startup catalog refresh: {}", error),
                None => info!(
                    "Startup catalog refresh loaded {} channels",
                    outcome.channel_count
                ),
            }
        });
    }

    let state = AppState::new(config, catalog, preferences, resolver);
    let web_server = WebServer::new(state)?;

    info!(
        "Web server starting on http://{}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    info!("Live TV Service stopped");
    Ok(())
}
