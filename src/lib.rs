pub mod bootstrap;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod server;
pub mod store;
pub mod types;

pub use bootstrap::{BootstrapOutcome, Bootstrapper, PopulationFailure, PopulationReport};
pub use config::Config;
pub use error::{GeoError, GeoResult};
pub use server::PolygonServer;
pub use store::{GeoStore, IndexStatus, RedisGeoStore};
