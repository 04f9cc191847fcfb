use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use country_cache::config::{Config, LogFormat};
use country_cache::http::{AppState, router};
use country_cache::refresh::RefreshPipeline;
use country_cache::sources::{HttpCountrySource, HttpRateSource, http_client};
use country_cache::store::CountryStore;
use country_cache::summary::SummaryImage;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    init_tracing(config.log_format);

    let validation = config.validate()?;
    if validation.has_warnings() {
        for warning in &validation.warnings {
            warn!("{warning}");
        }
    }

    let db_path = config.db_path();
    let store = CountryStore::file(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    info!(path = %db_path.display(), "Database ready");

    let client = http_client(config.fetch_timeout()).context("Failed to build HTTP client")?;
    let countries = Arc::new(HttpCountrySource::new(client.clone(), &config.countries_url));
    let rates = Arc::new(HttpRateSource::new(client, &config.rates_url));

    let pipeline = RefreshPipeline::new(countries, rates, store);
    let summary = SummaryImage::new(&config.cache_dir);
    let state = Arc::new(AppState::new(pipeline, summary));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
