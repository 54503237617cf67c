//! Demo server binary: loads the site configuration, builds the default
//! chain around the demo handler and serves it over axum.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use state_chain::config::{load_config, SiteConfig};
use state_chain::server::{self, demo_handler, AppState};
use state_chain::site::Site;
use state_chain::steps;

#[derive(Parser)]
#[command(about = "State-chain request pipeline demo server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "state_chain=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SiteConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        canonical_host = %config.canonical_host,
        canonical_scheme = %config.canonical_scheme,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let site = Arc::new(Site::new(config));
    let chain = Arc::new(steps::default_chain(demo_handler()));

    server::run(AppState { site, chain }, listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
