//! # OAuth Config Service Entry Point

use anyhow::Context;
use oauth_config::{
    config::ConfigLoader,
    crypto::CryptoKey,
    db::init_pool,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let key_bytes = config
        .crypto_key
        .clone()
        .context("crypto key missing after validation")?;
    let crypto_key = CryptoKey::new(key_bytes)?;

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied");

    run_server(config, db, crypto_key).await
}
