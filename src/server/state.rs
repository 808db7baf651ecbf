use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::store::{MemoryStore, PathUrlFormatter, StoreResult, UrlFormatter};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<MemoryStore>,
    pub url_formatter: Arc<dyn UrlFormatter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings, store: MemoryStore) -> Self {
        Self {
            settings: Arc::new(settings),
            store: Arc::new(store),
            url_formatter: Arc::new(PathUrlFormatter),
            started_at: Instant::now(),
        }
    }

    /// Build state from settings, seeding the store when a seed file is set
    pub fn from_settings(settings: Settings) -> StoreResult<Self> {
        let store = match &settings.store.seed_path {
            Some(path) => MemoryStore::load(path)?,
            None => {
                tracing::warn!("No store seed configured, starting with an empty store");
                MemoryStore::new()
            }
        };
        Ok(Self::new(settings, store))
    }
}
