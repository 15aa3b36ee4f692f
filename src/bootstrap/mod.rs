/// Index bootstrap
///
/// Runs once before the HTTP layer starts: checks the store answers, makes
/// sure the index exists and, only when it was just created, loads the
/// feature collection and inserts every polygon.


use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use geojson::FeatureCollection;
use tracing::{info, instrument, warn};

use crate::error::{GeoError, GeoResult};
use crate::features::{self, assign_identifiers, feature_identifier, load_feature_collection};
use crate::store::{GeoStore, IndexStatus};

/// Number of progress lines logged while populating
const PROGRESS_STEPS: usize = 10;

/// A polygon that could not be stored during population
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationFailure {
    pub id: String,
    pub reason: String,
}

impl From<PopulationFailure> for GeoError {
    fn from(failure: PopulationFailure) -> Self {
        GeoError::PopulationItem {
            id: failure.id,
            reason: failure.reason,
        }
    }
}

/// Summary of one population pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationReport {
    /// Polygons the store accepted
    pub inserted: usize,
    /// Features skipped because their geometry is not a polygon
    pub skipped: usize,
    /// Polygons not stored: rejected by the store, unidentified or with a repeated id
    pub failures: Vec<PopulationFailure>,
}

impl PopulationReport {
    /// Polygon features processed, stored or not
    pub fn attempted(&self) -> usize {
        self.inserted + self.failures.len()
    }
}

/// What bootstrap ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// Index was created and populated from the collection
    Populated(PopulationReport),
    /// Index was already there, population skipped
    AlreadyExisted,
}

/// Ensures the index exists and is populated
pub struct Bootstrapper {
    store: Arc<dyn GeoStore>,
}

impl Bootstrapper {
    pub fn new(store: Arc<dyn GeoStore>) -> Self {
        Self { store }
    }

    /// Ask the store to create `name`; an existing index is not an error
    pub async fn ensure_index(&self, name: &str) -> GeoResult<IndexStatus> {
        self.store.create_index(name).await.map_err(|e| match e {
            GeoError::Bootstrap(_) => e,
            other => GeoError::Bootstrap(other.to_string()),
        })
    }

    /// Insert every polygon of the collection, continuing past individual failures
    pub async fn populate(&self, name: &str, collection: &FeatureCollection) -> PopulationReport {
        let total = collection.features.len();
        let step = (total / PROGRESS_STEPS).max(1);
        let mut report = PopulationReport::default();
        let mut seen = HashSet::new();

        for (idx, feature) in collection.features.iter().enumerate() {
            if (idx + 1) % step == 0 {
                info!("Populating progress: {}%", 100 * (idx + 1) / total);
            }

            let body = match features::polygon_body(feature) {
                Ok(Some(body)) => body,
                Ok(None) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    let id = feature_identifier(feature).unwrap_or_else(|| format!("#{}", idx));
                    warn!("Cannot serialize polygon {}: {}", id, e);
                    report.failures.push(PopulationFailure {
                        id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(id) = feature_identifier(feature) else {
                warn!("Polygon at position {} has no identifier, not stored", idx);
                report.failures.push(PopulationFailure {
                    id: format!("#{}", idx),
                    reason: "missing identifier".to_string(),
                });
                continue;
            };

            // A repeated id would overwrite the polygon stored under it
            if !seen.insert(id.clone()) {
                warn!("Polygon at position {} reuses identifier {}, not stored", idx, id);
                report.failures.push(PopulationFailure {
                    id,
                    reason: "duplicate identifier".to_string(),
                });
                continue;
            }

            match self.store.insert_polygon(name, &id, &body).await {
                Ok(()) => report.inserted += 1,
                Err(e) => {
                    warn!("Error while storing polygon {} ({}): {}", id, body, e);
                    report.failures.push(PopulationFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Populating finished"
        );
        report
    }

    /// Full startup sequence: connectivity, index creation, population of a new index
    #[instrument(skip(self, geojson_path), fields(geojson = %geojson_path.as_ref().display()))]
    pub async fn bootstrap(&self, name: &str, geojson_path: impl AsRef<Path>) -> GeoResult<BootstrapOutcome> {
        info!("Testing store connection...");
        self.store.ping().await.map_err(|e| match e {
            GeoError::Connectivity(_) => e,
            other => GeoError::Connectivity(other.to_string()),
        })?;

        match self.ensure_index(name).await? {
            IndexStatus::AlreadyExists => {
                info!("Index {} already exists, skipping population", name);
                Ok(BootstrapOutcome::AlreadyExisted)
            }
            IndexStatus::Created => {
                info!("Index {} created, parsing geometries...", name);
                let mut collection = load_feature_collection(geojson_path)?;
                let assigned = assign_identifiers(&mut collection, name);
                info!(
                    "Populating index with {} features ({} identifiers assigned)...",
                    collection.features.len(),
                    assigned
                );
                let report = self.populate(name, &collection).await;
                Ok(BootstrapOutcome::Populated(report))
            }
        }
    }
}
