use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::AppState;
use crate::error::GeoError;
use crate::types::{
    FetchPolygonsRequest, IdsResponse, PingResponse, PointSearchRequest, PolygonResponse,
    PolygonSearchRequest, PolygonsResponse,
};

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn invalid_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid request".to_string(),
            message: message.into(),
        }),
    )
}

fn rejected(rejection: JsonRejection) -> ApiError {
    debug!("Rejected request body: {}", rejection.body_text());
    invalid_request(rejection.body_text())
}

fn store_failure(err: GeoError) -> ApiError {
    error!("Store query failed: {}", err);
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: "Store query failed".to_string(),
            message: err.to_string(),
        }),
    )
}

/// Stored bodies are JSON produced at population time; anything else is a store fault
fn parse_body(id: &str, body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| store_failure(GeoError::Store(format!("polygon {} holds invalid JSON: {}", id, e))))
}

fn ids_or_empty(ids: Option<Vec<String>>) -> Json<IdsResponse> {
    Json(IdsResponse {
        ids: ids.unwrap_or_default(),
    })
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

/// Store liveness plus the index being served
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let (status, label) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "index": state.index_name,
            "timestamp": chrono::Utc::now(),
        })),
    )
}

pub async fn list_polygons(State(state): State<Arc<AppState>>) -> Result<Json<IdsResponse>, ApiError> {
    let ids = state
        .store
        .list_ids(&state.index_name)
        .await
        .map_err(store_failure)?;
    Ok(ids_or_empty(ids))
}

pub async fn fetch_polygon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let body = state
        .store
        .get_polygon(&state.index_name, &id)
        .await
        .map_err(store_failure)?;

    match body {
        Some(body) => {
            let body = parse_body(&id, &body)?;
            Ok(Json(PolygonResponse { id, body }).into_response())
        }
        None => Ok((StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response()),
    }
}

pub async fn fetch_polygons(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FetchPolygonsRequest>, JsonRejection>,
) -> Result<Json<PolygonsResponse>, ApiError> {
    let Json(request) = payload.map_err(rejected)?;

    if request.ids.is_empty() {
        return Ok(Json(PolygonsResponse { polygons: Vec::new() }));
    }

    let bodies = state
        .store
        .get_polygons(&state.index_name, &request.ids)
        .await
        .map_err(store_failure)?;

    let mut polygons = Vec::with_capacity(bodies.len());
    for (id, body) in request.ids.into_iter().zip(bodies) {
        if let Some(body) = body {
            let body = parse_body(&id, &body)?;
            polygons.push(PolygonResponse { id, body });
        }
    }

    Ok(Json(PolygonsResponse { polygons }))
}

pub async fn search_by_polygon(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PolygonSearchRequest>, JsonRejection>,
) -> Result<Json<IdsResponse>, ApiError> {
    let Json(request) = payload.map_err(rejected)?;

    if request.polygon.is_empty() {
        return Err(invalid_request("polygon must contain at least one ring"));
    }
    if let Some(idx) = request.polygon.iter().position(|ring| ring.is_empty()) {
        return Err(invalid_request(format!("ring {} of polygon is empty", idx)));
    }

    let polygon = serde_json::to_string(&request.polygon).map_err(|e| invalid_request(e.to_string()))?;
    let ids = state
        .store
        .search_by_polygon(&state.index_name, &polygon)
        .await
        .map_err(store_failure)?;
    Ok(ids_or_empty(ids))
}

pub async fn search_by_point(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PointSearchRequest>, JsonRejection>,
) -> Result<Json<IdsResponse>, ApiError> {
    let Json(request) = payload.map_err(rejected)?;

    let point = serde_json::to_string(&request.point).map_err(|e| invalid_request(e.to_string()))?;
    let ids = state
        .store
        .search_by_point(&state.index_name, &point)
        .await
        .map_err(store_failure)?;
    Ok(ids_or_empty(ids))
}
