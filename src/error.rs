use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the polygon service
#[derive(Debug, Error)]
pub enum GeoError {
    /// Store unreachable at startup
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    /// Index creation answered with something other than success or "already exists"
    #[error("Index bootstrap failed: {0}")]
    Bootstrap(String),

    /// Feature collection could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Feature collection is not a well-formed GeoJSON FeatureCollection
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A single polygon insert failed during population
    #[error("Failed to store polygon {id}: {reason}")]
    PopulationItem { id: String, reason: String },

    /// Malformed HTTP request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Store command failed while serving a request
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GeoError {
    /// True for failures reading or parsing the feature collection
    pub fn is_load_error(&self) -> bool {
        matches!(self, GeoError::Io { .. } | GeoError::Parse { .. })
    }

    /// Errors that must stop the process before it serves traffic
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GeoError::Connectivity(_)
                | GeoError::Bootstrap(_)
                | GeoError::Io { .. }
                | GeoError::Parse { .. }
                | GeoError::Config(_)
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            GeoError::InvalidRequest(_) => 400,
            GeoError::Connectivity(_) => 503,
            GeoError::Bootstrap(_)
            | GeoError::Io { .. }
            | GeoError::Parse { .. }
            | GeoError::PopulationItem { .. }
            | GeoError::Store(_)
            | GeoError::Config(_)
            | GeoError::Serialization(_)
            | GeoError::Internal(_) => 500,
        }
    }
}

/// Result type alias for service operations
pub type GeoResult<T> = Result<T, GeoError>;
