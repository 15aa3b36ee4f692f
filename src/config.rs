use std::env;
use std::path::{Path, PathBuf};

use crate::error::{GeoError, GeoResult};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Index and source collection configuration
    pub index: IndexConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Prefix the polygon and search routes are nested under
    pub api_prefix: String,
    /// Directory holding the prebuilt front-end bundle
    pub static_dir: PathBuf,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
    /// Maximum Redis connections
    pub max_connections: u32,
    /// Connection and command timeout in seconds
    pub connection_timeout_secs: u64,
}

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Name of the S2GEO index
    pub name: String,
    /// GeoJSON feature collection loaded when the index is created
    pub geojson_path: PathBuf,
    /// Exit after bootstrap instead of serving HTTP
    pub bootstrap_only: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> GeoResult<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("Could not load .env file: {}", e);
        }

        let geojson_path = env::var("GEOJSON_PATH").unwrap_or_else(|_| DEFAULT_GEOJSON_PATH.to_string());
        let index_name = match env::var("INDEX_NAME") {
            Ok(name) => name,
            Err(_) => derive_index_name(&geojson_path).ok_or_else(|| {
                GeoError::Config(format!(
                    "INDEX_NAME is not set and cannot be derived from GEOJSON_PATH '{}'",
                    geojson_path
                ))
            })?,
        };

        let config = Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", "8080")?,
                max_request_size: parse_var("MAX_REQUEST_SIZE", "4194304")?, // 4MB
                api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
                static_dir: PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "./frontend".to_string())),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                max_connections: parse_var("REDIS_MAX_CONNECTIONS", "4")?,
                connection_timeout_secs: parse_var("REDIS_CONNECTION_TIMEOUT_SECS", "5")?,
            },
            index: IndexConfig {
                name: index_name,
                geojson_path: PathBuf::from(geojson_path),
                bootstrap_only: parse_var("BOOTSTRAP_ONLY", "false")?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> GeoResult<()> {
        if self.server.port == 0 {
            return Err(GeoError::Config("Server port cannot be 0".to_string()));
        }

        if !self.server.api_prefix.starts_with('/') || self.server.api_prefix.ends_with('/') {
            return Err(GeoError::Config(
                "API_PREFIX must start with '/' and must not end with '/'".to_string(),
            ));
        }

        if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://") {
            return Err(GeoError::Config("REDIS_URL must start with redis:// or rediss://".to_string()));
        }

        if self.redis.max_connections == 0 {
            return Err(GeoError::Config("REDIS_MAX_CONNECTIONS must be greater than 0".to_string()));
        }

        if self.index.name.trim().is_empty() {
            return Err(GeoError::Config("Index name cannot be empty".to_string()));
        }

        Ok(())
    }
}

const DEFAULT_GEOJSON_PATH: &str = "assets/Alaska.geojson";

fn parse_var<T>(key: &str, default: &str) -> GeoResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| GeoError::Config(format!("Invalid {}: {}", key, e)))
}

/// Index name used when none is configured: the lower-cased file stem
pub fn derive_index_name(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.trim().to_lowercase())
        .filter(|stem| !stem.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size: 4 * 1024 * 1024,
                api_prefix: "/api".to_string(),
                static_dir: PathBuf::from("./frontend"),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                max_connections: 4,
                connection_timeout_secs: 5,
            },
            index: IndexConfig {
                name: "alaska".to_string(),
                geojson_path: PathBuf::from(DEFAULT_GEOJSON_PATH),
                bootstrap_only: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.redis.url = "http://localhost:6379".to_string();
        assert!(config.validate().is_err());

        config.redis.url = "rediss://secure-redis:6380".to_string();
        assert!(config.validate().is_ok());

        config.server.api_prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.server.api_prefix = "/api/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_index_name_rejected() {
        let mut config = Config::default();
        config.index.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_index_name_derived_from_file_stem() {
        assert_eq!(derive_index_name("assets/Alaska.geojson").as_deref(), Some("alaska"));
        assert_eq!(derive_index_name("/data/zones.json").as_deref(), Some("zones"));
        assert_eq!(derive_index_name("countries").as_deref(), Some("countries"));
        assert_eq!(derive_index_name(""), None);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(config.index.name, "alaska");
        assert!(!config.index.bootstrap_only);
    }
}
