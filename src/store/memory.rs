//! In-memory data store using DashMap.
//!
//! Records and metadata live in memory and are lost on restart. The store can
//! be seeded from a JSON file so the service runs without a real CRM.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::backend::{DataStore, StoreError, StoreResult};
use super::types::{ColumnSet, EntityMetadata, Query, Record};

/// Contents of a seed file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub metadata: Vec<EntityMetadata>,
}

/// In-memory data store.
///
/// Records are keyed by `(entity, id)`. Queries scan every record of the
/// target entity, which is fine for seed-sized data sets, and return matches
/// in insertion order.
pub struct MemoryStore {
    records: DashMap<(String, Uuid), (u64, Record)>,
    metadata: DashMap<String, EntityMetadata>,
    next_seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            metadata: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Build a store from a parsed seed
    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        for record in seed.records {
            store.insert(record);
        }
        for meta in seed.metadata {
            store.insert_metadata(meta);
        }
        store
    }

    /// Load a JSON seed file
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let seed: StoreSeed = serde_json::from_str(&raw)?;

        tracing::info!(
            path = %path.display(),
            records = seed.records.len(),
            entities = seed.metadata.len(),
            "Loaded store seed"
        );

        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a record; a replaced record keeps its position
    pub fn insert(&self, record: Record) {
        self.records
            .entry((record.entity.clone(), record.id))
            .and_modify(|(_, existing)| *existing = record.clone())
            .or_insert_with(|| (self.next_seq.fetch_add(1, Ordering::Relaxed), record));
    }

    /// Insert or replace an entity's metadata
    pub fn insert_metadata(&self, metadata: EntityMetadata) {
        self.metadata.insert(metadata.entity.clone(), metadata);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl DataStore for MemoryStore {
    fn retrieve(&self, entity: &str, id: Uuid, columns: &ColumnSet) -> StoreResult<Record> {
        self.records
            .get(&(entity.to_string(), id))
            .map(|entry| entry.1.project(columns))
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id,
            })
    }

    fn retrieve_multiple(&self, query: &Query) -> StoreResult<Vec<Record>> {
        let mut matches: Vec<(u64, Record)> = self
            .records
            .iter()
            .filter(|entry| query.matches(&entry.value().1))
            .map(|entry| (entry.value().0, entry.value().1.project(&query.columns)))
            .collect();

        // DashMap iteration order is arbitrary
        matches.sort_by_key(|(seq, _)| *seq);
        let matches: Vec<Record> = matches.into_iter().map(|(_, record)| record).collect();

        tracing::debug!(
            entity = %query.entity,
            conditions = query.conditions.len(),
            matched = matches.len(),
            "Query executed"
        );

        Ok(matches)
    }

    fn entity_metadata(&self, entity: &str) -> StoreResult<EntityMetadata> {
        // Entities without registered metadata have no typed attributes
        Ok(self
            .metadata
            .get(entity)
            .map(|m| m.clone())
            .unwrap_or_else(|| EntityMetadata::new(entity)))
    }
}
