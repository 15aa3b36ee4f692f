/// In-memory store
///
/// Stand-in for the S2GEO module used by unit tests. Records every insert
/// and search and can simulate an unreachable or failing store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GeoStore, IndexStatus};
use crate::error::{GeoError, GeoResult};

#[derive(Default)]
pub(crate) struct MemoryStore {
    indexes: Mutex<HashMap<String, Vec<(String, String)>>>,
    inserts: Mutex<Vec<(String, String)>>,
    searches: Mutex<Vec<(&'static str, String)>>,
    search_hits: Mutex<Option<Vec<String>>>,
    failing_ids: HashSet<String>,
    unreachable: bool,
    failing_queries: bool,
    create_reply: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_failing_queries() -> Self {
        Self {
            failing_queries: true,
            ..Self::default()
        }
    }

    /// Make `S2GEO.ISET` answer with something other than OK
    pub fn with_create_reply(reply: &str) -> Self {
        Self {
            create_reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_inserts_for(mut self, ids: &[&str]) -> Self {
        self.failing_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_polygon(self, index: &str, id: &str, body: &str) -> Self {
        self.indexes
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .push((id.to_string(), body.to_string()));
        self
    }

    pub fn with_search_hits(self, ids: &[&str]) -> Self {
        *self.search_hits.lock().unwrap() = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    /// Every `(index, id)` passed to `S2GEO.POLYSET`, in call order
    pub fn inserts(&self) -> Vec<(String, String)> {
        self.inserts.lock().unwrap().clone()
    }

    /// Every search issued as `(command, payload)`
    pub fn searches(&self) -> Vec<(&'static str, String)> {
        self.searches.lock().unwrap().clone()
    }

    fn check_query(&self) -> GeoResult<()> {
        if self.failing_queries {
            return Err(GeoError::Store("connection reset by peer".to_string()));
        }
        Ok(())
    }

    fn record_search(&self, command: &'static str, payload: &str) -> GeoResult<Option<Vec<String>>> {
        self.check_query()?;
        self.searches.lock().unwrap().push((command, payload.to_string()));
        Ok(self.search_hits.lock().unwrap().clone())
    }
}

#[async_trait]
impl GeoStore for MemoryStore {
    async fn ping(&self) -> GeoResult<()> {
        if self.unreachable {
            return Err(GeoError::Connectivity("connection refused".to_string()));
        }
        Ok(())
    }

    async fn create_index(&self, index: &str) -> GeoResult<IndexStatus> {
        if let Some(reply) = &self.create_reply {
            return Err(GeoError::Bootstrap(format!("unexpected response returned: {}", reply)));
        }

        let mut indexes = self.indexes.lock().unwrap();
        if indexes.contains_key(index) {
            return Ok(IndexStatus::AlreadyExists);
        }
        indexes.insert(index.to_string(), Vec::new());
        Ok(IndexStatus::Created)
    }

    async fn insert_polygon(&self, index: &str, id: &str, body: &str) -> GeoResult<()> {
        self.inserts.lock().unwrap().push((index.to_string(), id.to_string()));

        if self.failing_ids.contains(id) {
            return Err(GeoError::Store("ERR invalid polygon".to_string()));
        }

        let mut indexes = self.indexes.lock().unwrap();
        let records = indexes
            .get_mut(index)
            .ok_or_else(|| GeoError::Store("ERR index does not exist".to_string()))?;
        records.retain(|(existing, _)| existing != id);
        records.push((id.to_string(), body.to_string()));
        Ok(())
    }

    async fn list_ids(&self, index: &str) -> GeoResult<Option<Vec<String>>> {
        self.check_query()?;
        let indexes = self.indexes.lock().unwrap();
        Ok(indexes
            .get(index)
            .filter(|records| !records.is_empty())
            .map(|records| records.iter().map(|(id, _)| id.clone()).collect()))
    }

    async fn get_polygon(&self, index: &str, id: &str) -> GeoResult<Option<String>> {
        self.check_query()?;
        let indexes = self.indexes.lock().unwrap();
        Ok(indexes
            .get(index)
            .and_then(|records| records.iter().find(|(existing, _)| existing == id))
            .map(|(_, body)| body.clone()))
    }

    async fn get_polygons(&self, index: &str, ids: &[String]) -> GeoResult<Vec<Option<String>>> {
        self.check_query()?;
        let indexes = self.indexes.lock().unwrap();
        let records = indexes.get(index);
        Ok(ids
            .iter()
            .map(|id| {
                records
                    .and_then(|records| records.iter().find(|(existing, _)| existing == id))
                    .map(|(_, body)| body.clone())
            })
            .collect())
    }

    async fn search_by_polygon(&self, _index: &str, polygon: &str) -> GeoResult<Option<Vec<String>>> {
        self.record_search("S2GEO.POLYSEARCH", polygon)
    }

    async fn search_by_point(&self, _index: &str, point: &str) -> GeoResult<Option<Vec<String>>> {
        self.record_search("S2GEO.POINTSEARCH", point)
    }
}
