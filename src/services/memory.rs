use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::models::{CandidateProfile, Event, Match, MatchRow, NewEvent, ReferrerProfile};
use crate::services::store::{EventLog, HealthCheck, MatchStore, ProfileStore, StoreError};

/// Errors that can occur with the in-process store
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    InvalidSeed(#[from] serde_json::Error),
}

/// Profiles loaded into a [`MemoryStore`] at startup
#[derive(Debug, Default, Deserialize)]
pub struct MemorySeed {
    #[serde(default)]
    pub candidates: Vec<CandidateProfile>,
    #[serde(default)]
    pub referrers: Vec<ReferrerProfile>,
}

#[derive(Debug, Default)]
struct MemoryState {
    candidates: Vec<CandidateProfile>,
    referrers: Vec<ReferrerProfile>,
    matches: BTreeMap<(String, String), Match>,
    events: Vec<Event>,
}

/// In-process store keeping every table in memory
///
/// Matches are keyed on `(candidate_id, referrer_id)` so an upsert replaces
/// the score and breakdown of an existing pair in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(candidates: Vec<CandidateProfile>, referrers: Vec<ReferrerProfile>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                candidates,
                referrers,
                ..MemoryState::default()
            }),
        }
    }

    /// Build a store from a JSON file of `{ "candidates": [...], "referrers": [...] }`
    pub async fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, MemoryStoreError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let seed: MemorySeed = serde_json::from_slice(&bytes)?;

        tracing::info!(
            "Seeded memory store with {} candidates and {} referrers",
            seed.candidates.len(),
            seed.referrers.len()
        );

        Ok(Self::with_profiles(seed.candidates, seed.referrers))
    }

    /// Insert or replace a candidate profile by id
    pub fn put_candidate(&self, candidate: CandidateProfile) -> Result<(), MemoryStoreError> {
        let mut state = self.write()?;
        match state.candidates.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) => *existing = candidate,
            None => state.candidates.push(candidate),
        }
        Ok(())
    }

    /// Insert or replace a referrer profile by id
    pub fn put_referrer(&self, referrer: ReferrerProfile) -> Result<(), MemoryStoreError> {
        let mut state = self.write()?;
        match state.referrers.iter_mut().find(|r| r.id == referrer.id) {
            Some(existing) => *existing = referrer,
            None => state.referrers.push(referrer),
        }
        Ok(())
    }

    /// Snapshot of all stored matches, ordered by key
    pub fn all_matches(&self) -> Result<Vec<Match>, MemoryStoreError> {
        Ok(self.read()?.matches.values().cloned().collect())
    }

    /// Snapshot of the audit log in insertion order
    pub fn events(&self) -> Result<Vec<Event>, MemoryStoreError> {
        Ok(self.read()?.events.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, MemoryStoreError> {
        self.state.read().map_err(|_| MemoryStoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, MemoryStoreError> {
        self.state.write().map_err(|_| MemoryStoreError::Poisoned)
    }

    fn ranked<F>(&self, filter: F, limit: usize) -> Result<Vec<Match>, MemoryStoreError>
    where
        F: Fn(&Match) -> bool,
    {
        let state = self.read()?;
        let mut matches: Vec<Match> = state.matches.values().filter(|m| filter(m)).cloned().collect();

        // BTreeMap iteration already orders ties by (candidate_id, referrer_id)
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load_candidates(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        Ok(self.read()?.candidates.clone())
    }

    async fn load_referrers(&self) -> Result<Vec<ReferrerProfile>, StoreError> {
        Ok(self.read()?.referrers.clone())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn upsert_matches(&self, rows: &[MatchRow]) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        let now = chrono::Utc::now();

        for row in rows {
            let key = (row.candidate_id.clone(), row.referrer_id.clone());
            state
                .matches
                .entry(key)
                .and_modify(|existing| {
                    existing.score = row.score;
                    existing.breakdown = row.breakdown;
                })
                .or_insert_with(|| Match {
                    id: uuid::Uuid::new_v4(),
                    candidate_id: row.candidate_id.clone(),
                    referrer_id: row.referrer_id.clone(),
                    score: row.score,
                    breakdown: row.breakdown,
                    created_at: now,
                });
        }

        Ok(rows.len() as u64)
    }

    async fn matches_for_referrer(
        &self,
        referrer_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self.ranked(|m| m.referrer_id == referrer_id, limit)?)
    }

    async fn matches_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self.ranked(|m| m.candidate_id == candidate_id, limit)?)
    }

    async fn count_matches(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.matches.len() as u64)
    }
}

#[async_trait]
impl EventLog for MemoryStore {
    async fn record_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.events.push(Event {
            id: uuid::Uuid::new_v4(),
            user_id: event.user_id,
            event_type: event.event_type,
            payload: event.payload,
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn health_check(&self) -> bool {
        self.read().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreBreakdown;

    fn row(candidate_id: &str, referrer_id: &str, score: f64) -> MatchRow {
        MatchRow {
            candidate_id: candidate_id.to_string(),
            referrer_id: referrer_id.to_string(),
            score,
            breakdown: ScoreBreakdown {
                role_alignment: score,
                risk_reduction: score,
                intent_fit: score,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_pair() {
        let store = MemoryStore::new();

        store.upsert_matches(&[row("c1", "r1", 0.5)]).await.unwrap();
        let first = store.all_matches().unwrap();

        store.upsert_matches(&[row("c1", "r1", 0.8)]).await.unwrap();
        let second = store.all_matches().unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].score, 0.8);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].created_at, first[0].created_at);
    }

    #[tokio::test]
    async fn test_listing_orders_by_score() {
        let store = MemoryStore::new();
        store
            .upsert_matches(&[row("c1", "r1", 0.2), row("c2", "r1", 0.9), row("c3", "r2", 0.5)])
            .await
            .unwrap();

        let matches = store.matches_for_referrer("r1", 10).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);

        let limited = store.matches_for_referrer("r1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let for_candidate = store.matches_for_candidate("c3", 10).await.unwrap();
        assert_eq!(for_candidate.len(), 1);
        assert_eq!(store.count_matches().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_put_profile_replaces_by_id() {
        let store = MemoryStore::new();
        let mut candidate = CandidateProfile {
            id: "c1".to_string(),
            seniority: "mid".to_string(),
            skills: vec![],
            domains: vec![],
            intent_role: "SWE".to_string(),
            impact_score: 10.0,
        };

        store.put_candidate(candidate.clone()).unwrap();
        candidate.impact_score = 80.0;
        store.put_candidate(candidate).unwrap();

        let candidates = store.load_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].impact_score, 80.0);
    }

    #[tokio::test]
    async fn test_seed_file_round_trip() {
        let path = std::env::temp_dir().join(format!("vouch-seed-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"{"candidates": [{"userId": "c1", "seniority": "senior"}], "referrers": [{"userId": "r1"}]}"#,
        )
        .await
        .unwrap();

        let store = MemoryStore::from_seed_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(store.load_candidates().await.unwrap().len(), 1);
        assert_eq!(store.load_referrers().await.unwrap()[0].id, "r1");
    }

    #[tokio::test]
    async fn test_missing_seed_file() {
        let result = MemoryStore::from_seed_file("/nonexistent/vouch-seed.json").await;
        assert!(matches!(result, Err(MemoryStoreError::Io(_))));
    }
}
