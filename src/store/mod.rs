/// Store module
///
/// Client side of the S2GEO command protocol. The Redis module owns every
/// spatial algorithm; this layer only shapes arguments and replies.

mod redis_client;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

use crate::error::GeoResult;

pub use redis_client::RedisGeoStore;

/// Outcome of an index creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// Commands understood by the S2GEO module.
///
/// `None` is the store's nil reply and is never an error. Callers decide what
/// absence means for them.
#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Check the store answers at all
    async fn ping(&self) -> GeoResult<()>;

    /// `S2GEO.ISET`
    async fn create_index(&self, index: &str) -> GeoResult<IndexStatus>;

    /// `S2GEO.POLYSET`
    async fn insert_polygon(&self, index: &str, id: &str, body: &str) -> GeoResult<()>;

    /// `S2GEO.POLYLIST`
    async fn list_ids(&self, index: &str) -> GeoResult<Option<Vec<String>>>;

    /// `S2GEO.POLYGET`
    async fn get_polygon(&self, index: &str, id: &str) -> GeoResult<Option<String>>;

    /// `S2GEO.POLYMGET`, one entry per requested id in request order
    async fn get_polygons(&self, index: &str, ids: &[String]) -> GeoResult<Vec<Option<String>>>;

    /// `S2GEO.POLYSEARCH`
    async fn search_by_polygon(&self, index: &str, polygon: &str) -> GeoResult<Option<Vec<String>>>;

    /// `S2GEO.POINTSEARCH`
    async fn search_by_point(&self, index: &str, point: &str) -> GeoResult<Option<Vec<String>>>;
}
