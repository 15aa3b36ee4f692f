use std::sync::Arc;

use s2geo_api::{logging, BootstrapOutcome, Config, GeoError, PolygonServer, RedisGeoStore};

#[tokio::main]
async fn main() -> Result<(), GeoError> {
    logging::init_logging()?;

    tracing::info!("Starting s2geo polygon API");

    let config = Config::from_env()?;
    let bootstrap_only = config.index.bootstrap_only;

    let store = Arc::new(RedisGeoStore::connect(config.redis.clone()).await?);
    let server = PolygonServer::new(config, store.clone());

    match server.bootstrap().await? {
        BootstrapOutcome::Populated(report) => tracing::info!(
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Index bootstrapped"
        ),
        BootstrapOutcome::AlreadyExisted => tracing::info!("Index already exists, serving as is"),
    }

    if !bootstrap_only {
        server.run().await?;
    }

    store.disconnect().await;
    Ok(())
}
