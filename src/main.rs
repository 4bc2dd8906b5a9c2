//! stitchbase server entry point
//!
//! Loads configuration, initializes logging and storage, then serves the
//! API until stopped.

use stitchbase::config::AppConfig;
use stitchbase::http_server::{AppState, HttpServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(&config).await?;
    HttpServer::new(state, config.http.clone()).start().await?;
    Ok(())
}
