/// GeoJSON loading
///
/// Reads the source feature collection, assigns stable identifiers and
/// extracts the polygon bodies handed to the store during population.

use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{GeoError, GeoResult};

/// Property holding a feature's identifier
pub const ID_PROPERTY: &str = "ID";

/// Read and parse a GeoJSON FeatureCollection, preserving document order
pub fn load_feature_collection(path: impl AsRef<Path>) -> GeoResult<FeatureCollection> {
    let path = path.as_ref();

    let data = fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let collection: FeatureCollection = data.parse().map_err(|e: geojson::Error| GeoError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!("Parsed {} features from {}", collection.features.len(), path.display());
    Ok(collection)
}

/// Give every feature without an `ID` property (or with a null one) the identifier `<prefix>_<ordinal>`.
///
/// Existing identifiers are left untouched. Returns the number of identifiers assigned.
pub fn assign_identifiers(collection: &mut FeatureCollection, prefix: &str) -> usize {
    let mut assigned = 0;
    for (idx, feature) in collection.features.iter_mut().enumerate() {
        if !matches!(feature.property(ID_PROPERTY), None | Some(JsonValue::Null)) {
            continue;
        }
        feature.set_property(ID_PROPERTY, format!("{}_{}", prefix, idx));
        assigned += 1;
    }
    assigned
}

/// Identifier of a feature; non-string identifiers are rendered as JSON text
pub fn feature_identifier(feature: &Feature) -> Option<String> {
    match feature.property(ID_PROPERTY)? {
        JsonValue::Null => None,
        JsonValue::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

/// Canonical JSON of a polygon's rings, `None` for any other geometry
pub fn polygon_body(feature: &Feature) -> GeoResult<Option<String>> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => Ok(Some(serde_json::to_string(rings)?)),
        _ => Ok(None),
    }
}
