use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `[lon, lat]`
pub type Position = [f64; 2];

/// Body of `POST /polygons`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPolygonsRequest {
    pub ids: Vec<String>,
}

/// Body of `POST /search/polygons/by_polygon`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonSearchRequest {
    /// Rings of `[lon, lat]` positions, outer ring first
    pub polygon: Vec<Vec<Position>>,
}

/// Body of `POST /search/polygons/by_point`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSearchRequest {
    pub point: Position,
}

/// One stored polygon; `body` is the JSON the store holds, passed through as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonResponse {
    pub id: String,
    pub body: Value,
}

/// List of polygon identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdsResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonsResponse {
    pub polygons: Vec<PolygonResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
