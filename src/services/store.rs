use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{CandidateProfile, Match, MatchRow, NewEvent, ReferrerProfile};
use crate::services::{MemoryStoreError, PostgresError, RestError};

/// Errors surfaced by any store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Postgres(#[from] PostgresError),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    Memory(#[from] MemoryStoreError),
}

/// Read access to the candidate and referrer populations
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_candidates(&self) -> Result<Vec<CandidateProfile>, StoreError>;

    async fn load_referrers(&self) -> Result<Vec<ReferrerProfile>, StoreError>;
}

/// Persistence for generated matches
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert or overwrite rows keyed on `(candidate_id, referrer_id)`
    ///
    /// Overwrites refresh `score` and `breakdown` only; `created_at` keeps
    /// the value from the first insert. Returns the number of rows written.
    async fn upsert_matches(&self, rows: &[MatchRow]) -> Result<u64, StoreError>;

    /// Matches for a referrer, best score first
    async fn matches_for_referrer(
        &self,
        referrer_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError>;

    /// Matches for a candidate, best score first
    async fn matches_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError>;

    async fn count_matches(&self) -> Result<u64, StoreError>;
}

/// Append-only audit log
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn record_event(&self, event: NewEvent) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> bool;
}

/// Shared handles onto one backend, split by concern
#[derive(Clone)]
pub struct StoreHandles {
    pub backend: &'static str,
    pub profiles: Arc<dyn ProfileStore>,
    pub matches: Arc<dyn MatchStore>,
    pub events: Arc<dyn EventLog>,
    pub health: Arc<dyn HealthCheck>,
}

impl StoreHandles {
    pub fn from_store<S>(backend: &'static str, store: Arc<S>) -> Self
    where
        S: ProfileStore + MatchStore + EventLog + HealthCheck + 'static,
    {
        Self {
            backend,
            profiles: store.clone(),
            matches: store.clone(),
            events: store.clone(),
            health: store,
        }
    }
}

/// Record an audit event, logging instead of failing when the store errors
pub async fn log_event(
    events: &dyn EventLog,
    user_id: Option<&str>,
    event_type: &str,
    payload: serde_json::Value,
) {
    let event = NewEvent {
        user_id: user_id.map(str::to_string),
        event_type: event_type.to_string(),
        payload,
    };

    if let Err(e) = events.record_event(event).await {
        tracing::error!("Failed to log \"{}\" event: {}", event_type, e);
    }
}
