use std::time::Duration;

use async_trait::async_trait;
use fred::{
    clients::RedisPool,
    cmd,
    error::RedisError,
    interfaces::ClientLike,
    types::{Builder, CustomCommand, RedisConfig as FredRedisConfig, RedisValue},
};
use tokio::time::timeout;
use tracing::{debug, error, info};
use url::Url;

use super::{GeoStore, IndexStatus};
use crate::config::RedisConfig;
use crate::error::{GeoError, GeoResult};

/// Error text the module replies with when `S2GEO.ISET` targets an existing index
const INDEX_EXISTS_REPLY: &str = "index already exists";

/// S2GEO client on top of a fred connection pool
pub struct RedisGeoStore {
    /// Fred Redis client with connection pooling
    pool: RedisPool,
    /// Configuration
    config: RedisConfig,
}

impl RedisGeoStore {
    /// Create the pool and wait until every connection is up
    pub async fn connect(config: RedisConfig) -> GeoResult<Self> {
        info!("Connecting to Redis at {}", redact_url(&config.url));

        let redis_config = FredRedisConfig::from_url(&config.url)
            .map_err(|e| GeoError::Config(format!("Invalid Redis URL: {}", e)))?;

        let timeout_secs = config.connection_timeout_secs;
        let pool = Builder::from_config(redis_config)
            .with_connection_config(|conn_config| {
                conn_config.connection_timeout = Duration::from_secs(timeout_secs);
            })
            .with_performance_config(|perf_config| {
                perf_config.default_command_timeout = Duration::from_secs(timeout_secs);
            })
            .build_pool(config.max_connections as usize)
            .map_err(|e| GeoError::Connectivity(format!("Failed to create Redis pool: {}", e)))?;

        // The connection tasks run in the background for the lifetime of the pool
        let _connection = pool.connect();

        match timeout(Duration::from_secs(timeout_secs), pool.wait_for_connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(GeoError::Connectivity(format!("Failed to connect to Redis: {}", e)));
            }
            Err(_) => {
                return Err(GeoError::Connectivity(format!(
                    "Timed out after {}s connecting to Redis",
                    timeout_secs
                )));
            }
        }

        info!("Redis pool connected ({} connections)", config.max_connections);
        Ok(Self { pool, config })
    }

    /// Close every pooled connection
    pub async fn disconnect(&self) {
        if let Err(e) = self.pool.quit().await {
            error!("Error while closing Redis connections: {}", e);
        }
    }

    async fn command(&self, command: CustomCommand, args: Vec<String>) -> Result<RedisValue, RedisError> {
        self.pool.next().custom::<RedisValue, String>(command, args).await
    }
}

#[async_trait]
impl GeoStore for RedisGeoStore {
    async fn ping(&self) -> GeoResult<()> {
        let result = timeout(
            Duration::from_secs(self.config.connection_timeout_secs),
            self.pool.next().ping::<String>(),
        )
        .await;

        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(GeoError::Connectivity(format!("PING failed: {}", e))),
            Err(_) => Err(GeoError::Connectivity("PING timed out".to_string())),
        }
    }

    async fn create_index(&self, index: &str) -> GeoResult<IndexStatus> {
        match self.command(cmd!("S2GEO.ISET"), vec![index.to_string()]).await {
            Ok(reply) => index_status_from_reply(&reply),
            Err(e) if e.details().contains(INDEX_EXISTS_REPLY) => Ok(IndexStatus::AlreadyExists),
            Err(e) => Err(GeoError::Bootstrap(format!("index creation failed: {}", e))),
        }
    }

    async fn insert_polygon(&self, index: &str, id: &str, body: &str) -> GeoResult<()> {
        debug!("S2GEO.POLYSET {} {} ({} bytes)", index, id, body.len());
        self.command(
            cmd!("S2GEO.POLYSET"),
            vec![index.to_string(), id.to_string(), body.to_string()],
        )
        .await
        .map(|_| ())
        .map_err(|e| GeoError::Store(e.to_string()))
    }

    async fn list_ids(&self, index: &str) -> GeoResult<Option<Vec<String>>> {
        let reply = self
            .command(cmd!("S2GEO.POLYLIST"), vec![index.to_string()])
            .await
            .map_err(|e| GeoError::Store(format!("S2GEO.POLYLIST failed: {}", e)))?;
        id_list_from_reply("S2GEO.POLYLIST", reply)
    }

    async fn get_polygon(&self, index: &str, id: &str) -> GeoResult<Option<String>> {
        let reply = self
            .command(cmd!("S2GEO.POLYGET"), vec![index.to_string(), id.to_string()])
            .await
            .map_err(|e| GeoError::Store(format!("S2GEO.POLYGET failed: {}", e)))?;
        Ok(optional_string(reply))
    }

    async fn get_polygons(&self, index: &str, ids: &[String]) -> GeoResult<Vec<Option<String>>> {
        let mut args = Vec::with_capacity(ids.len() + 1);
        args.push(index.to_string());
        args.extend(ids.iter().cloned());

        let reply = self
            .command(cmd!("S2GEO.POLYMGET"), args)
            .await
            .map_err(|e| GeoError::Store(format!("S2GEO.POLYMGET failed: {}", e)))?;

        match reply {
            RedisValue::Null => Ok(Vec::new()),
            RedisValue::Array(items) => Ok(items.into_iter().map(optional_string).collect()),
            other => Err(GeoError::Store(format!(
                "unexpected reply to S2GEO.POLYMGET: {:?}",
                other
            ))),
        }
    }

    async fn search_by_polygon(&self, index: &str, polygon: &str) -> GeoResult<Option<Vec<String>>> {
        let reply = self
            .command(cmd!("S2GEO.POLYSEARCH"), vec![index.to_string(), polygon.to_string()])
            .await
            .map_err(|e| GeoError::Store(format!("S2GEO.POLYSEARCH failed: {}", e)))?;
        id_list_from_reply("S2GEO.POLYSEARCH", reply)
    }

    async fn search_by_point(&self, index: &str, point: &str) -> GeoResult<Option<Vec<String>>> {
        let reply = self
            .command(cmd!("S2GEO.POINTSEARCH"), vec![index.to_string(), point.to_string()])
            .await
            .map_err(|e| GeoError::Store(format!("S2GEO.POINTSEARCH failed: {}", e)))?;
        id_list_from_reply("S2GEO.POINTSEARCH", reply)
    }
}

fn index_status_from_reply(reply: &RedisValue) -> GeoResult<IndexStatus> {
    match reply.as_str().as_deref() {
        Some("OK") => Ok(IndexStatus::Created),
        _ => Err(GeoError::Bootstrap(format!(
            "unexpected response returned: {:?}",
            reply
        ))),
    }
}

fn optional_string(value: RedisValue) -> Option<String> {
    if value.is_null() {
        None
    } else {
        value.into_string()
    }
}

fn id_list_from_reply(command: &str, reply: RedisValue) -> GeoResult<Option<Vec<String>>> {
    match reply {
        RedisValue::Null => Ok(None),
        RedisValue::Array(items) => Ok(Some(items.into_iter().filter_map(optional_string).collect())),
        other => Err(GeoError::Store(format!(
            "unexpected reply to {}: {:?}",
            command, other
        ))),
    }
}

/// Strip credentials before a Redis URL reaches the logs
fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
