//! Store wrapper used by engine tests to observe and break store access

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;
use uuid::Uuid;

use crate::store::{
    ColumnSet, DataStore, EntityMetadata, MemoryStore, Query, Record, StoreError, StoreResult,
};

pub struct CountingStore {
    inner: MemoryStore,
    metadata_calls: DashMap<String, usize>,
    queries: AtomicUsize,
    fail: AtomicBool,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            metadata_calls: DashMap::new(),
            queries: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Every retrieve/query fails as if the store were unreachable
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn metadata_calls(&self, entity: &str) -> usize {
        self.metadata_calls.get(entity).map(|c| *c).unwrap_or(0)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DataStore for CountingStore {
    fn retrieve(&self, entity: &str, id: Uuid, columns: &ColumnSet) -> StoreResult<Record> {
        self.check()?;
        self.inner.retrieve(entity, id, columns)
    }

    fn retrieve_multiple(&self, query: &Query) -> StoreResult<Vec<Record>> {
        self.check()?;
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.retrieve_multiple(query)
    }

    fn entity_metadata(&self, entity: &str) -> StoreResult<EntityMetadata> {
        *self.metadata_calls.entry(entity.to_string()).or_insert(0) += 1;
        self.inner.entity_metadata(entity)
    }
}
