//! One-shot import of popular games from IGDB into the library database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ludex_core::{
    load_config, validate_config, GameLibrary, GameSource, IgdbClient, Importer, SqliteLibrary,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Import failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("LUDEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("ludex.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let igdb_config = config
        .igdb
        .clone()
        .context("An [igdb] section with client_id and access_token is required")?;
    let source: Arc<dyn GameSource> =
        Arc::new(IgdbClient::new(igdb_config).context("Failed to create IGDB client")?);

    let library: Arc<dyn GameLibrary> = Arc::new(
        SqliteLibrary::new(&config.database.path).context("Failed to open game library")?,
    );
    info!("Importing into {:?}", config.database.path);

    let report = Importer::new(source, Arc::clone(&library), config.import.clone())
        .run()
        .await
        .context("Import aborted")?;

    let stats = library.stats().context("Failed to read library stats")?;
    info!(
        "Done: {} created, {} skipped, {} failed; library now holds {} games",
        report.created, report.skipped, report.failed, stats.games
    );
    Ok(())
}
