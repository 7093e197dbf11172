//! Cairn server binary.

use anyhow::{Context, Result};
use cairn_core::config::AppConfig;
use cairn_server::{ServiceContext, create_router};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cairn - a content-addressed object store with a signed tag registry
#[derive(Parser, Debug)]
#[command(name = "cairnd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CAIRN_CONFIG", default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("cairn v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: TOML file if present, CAIRN_ env vars on top.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("no config file found at {}", args.config);
    }
    let config: AppConfig = figment
        .merge(Env::prefixed("CAIRN_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    if config.users.is_empty() {
        tracing::warn!("no principals configured; every request will be rejected");
    }

    let ctx = ServiceContext::from_config(config.clone())
        .await
        .context("failed to assemble service")?;

    let app = create_router(ctx);

    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .context("invalid listen address")?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
