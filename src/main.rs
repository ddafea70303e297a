use matchday_core::config::Config;
use matchday_core::db::{health_check, run_migrations, StoreConnector};
use matchday_core::telemetry::init_telemetry;

/// Prepares the record store schema for the match tables.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize telemetry
    init_telemetry(&config.telemetry.rust_log);

    let connector = StoreConnector::new(config.database.clone());
    let store = connector.connect().await?;

    tracing::info!("Applying record store migrations");
    run_migrations(store.pool()).await?;
    health_check(store.pool()).await?;

    tracing::info!(
        tick_ms = config.clock.tick_millis,
        "Record store ready"
    );
    Ok(())
}
