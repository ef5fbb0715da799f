// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod rest;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::{MemorySeed, MemoryStore, MemoryStoreError};
pub use postgres::{PostgresClient, PostgresError};
pub use rest::{RestError, RestStore, RestTables};
pub use store::{
    log_event, EventLog, HealthCheck, MatchStore, ProfileStore, StoreError, StoreHandles,
};

use crate::config::{Settings, StoreBackend};
use std::sync::Arc;
use std::time::Duration;

/// Connect the store backend selected in settings
pub async fn connect_store(settings: &Settings) -> Result<StoreHandles, StoreError> {
    match settings.store.backend {
        StoreBackend::Postgres => {
            let database = &settings.database;
            let client = PostgresClient::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
                database.acquire_timeout_secs,
                database.idle_timeout_secs,
            )
            .await?;

            Ok(StoreHandles::from_store("postgres", Arc::new(client)))
        }
        StoreBackend::Rest => {
            let rest = &settings.rest;
            let tables = RestTables {
                candidate_profiles: rest.candidate_profiles_table.clone(),
                referrer_profiles: rest.referrer_profiles_table.clone(),
                matches: rest.matches_table.clone(),
                events: rest.events_table.clone(),
            };
            let client = RestStore::new(
                rest.url.clone(),
                rest.service_key.clone(),
                tables,
                Duration::from_secs(rest.timeout_secs),
            )?;

            Ok(StoreHandles::from_store("rest", Arc::new(client)))
        }
        StoreBackend::Memory => {
            let store = match &settings.store.memory_seed_path {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };

            Ok(StoreHandles::from_store("memory", Arc::new(store)))
        }
    }
}
