use anyhow::{Context, Result};
use clap::Parser;
use sana_consult::{
    create_router, AppState, Config, HttpReportSink, HttpSessionDirectory, NatsChannelFactory,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "sana-consult", about = "Voice consultation call service")]
struct Cli {
    /// Config file path (without extension)
    #[arg(long, default_value = "config/sana-consult")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v0.1.0", cfg.service.name);

    if cfg.channel.api_key.is_none() {
        warn!("Channel API key is not configured; calls will be refused until one is set");
    }

    let directory = Arc::new(HttpSessionDirectory::new(cfg.directory.base_url.clone()));
    let reports = Arc::new(HttpReportSink::new(cfg.reports.base_url.clone()));
    let channels = Arc::new(NatsChannelFactory::new(cfg.channel.nats_url.clone()));

    let state = AppState::new(directory, reports, channels, cfg.channel.clone());
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
