use tracing_subscriber::EnvFilter;

use crate::error::{GeoError, GeoResult};

/// Install the global JSON subscriber; `RUST_LOG` overrides the default `info` filter
pub fn init_logging() -> GeoResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .json()
        .try_init()
        .map_err(|e| GeoError::Internal(format!("Failed to initialize logging: {}", e)))
}
