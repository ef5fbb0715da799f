use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};

use crate::core::scoring::compute_score;
use crate::models::{CandidateProfile, GenerationReport, MatchRow, MatchScore, ReferrerProfile};
use crate::services::store::{log_event, EventLog, MatchStore, ProfileStore, StoreHandles};

/// Matches kept per referrer by default
pub const TOP_N_PER_REFERRER: usize = 25;

/// Audit event type written after a fully successful run
pub const MATCH_GENERATED_EVENT: &str = "match_generated";

/// Tunables for a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub top_n: usize,
    pub concurrency: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            top_n: TOP_N_PER_REFERRER,
            concurrency: 4,
        }
    }
}

/// Rank every candidate for one referrer and keep the best `top_n`
///
/// Sorted by total score descending, ties by candidate id ascending, then by
/// input position. A candidate id seen twice keeps only its first ranked row.
pub fn rank_candidates(
    referrer: &ReferrerProfile,
    candidates: &[CandidateProfile],
    top_n: usize,
) -> Vec<MatchRow> {
    let mut scored: Vec<(&CandidateProfile, MatchScore)> = candidates
        .iter()
        .map(|candidate| (candidate, compute_score(candidate, referrer)))
        .collect();

    scored.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .total_score
            .partial_cmp(&a_score.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .filter(|(candidate, _)| seen.insert(candidate.id.clone()))
        .take(top_n)
        .map(|(candidate, score)| MatchRow {
            candidate_id: candidate.id.clone(),
            referrer_id: referrer.id.clone(),
            score: score.total_score,
            breakdown: score.breakdown,
        })
        .collect()
}

/// Produces and persists the match set for the whole profile population
///
/// # Run
/// 1. Load all candidates and referrers (either failing aborts the run)
/// 2. Rank candidates per referrer and keep the top N
/// 3. Upsert each referrer's rows; failures are recorded and skipped
/// 4. Record a `match_generated` event when no referrer failed
#[derive(Clone)]
pub struct MatchGenerator {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchStore>,
    events: Arc<dyn EventLog>,
    options: GeneratorOptions,
    run_lock: Arc<Mutex<()>>,
}

impl MatchGenerator {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchStore>,
        events: Arc<dyn EventLog>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            profiles,
            matches,
            events,
            options,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_handles(stores: &StoreHandles, options: GeneratorOptions) -> Self {
        Self::new(
            stores.profiles.clone(),
            stores.matches.clone(),
            stores.events.clone(),
            options,
        )
    }

    pub fn options(&self) -> GeneratorOptions {
        self.options
    }

    /// Generate and persist matches for every referrer
    ///
    /// Never fails: load errors abort with a single error string, upsert
    /// errors are collected per referrer. Concurrent calls are serialized.
    pub async fn generate_matches(&self) -> GenerationReport {
        let _running = self.run_lock.lock().await;
        let started = Instant::now();

        let candidates = match self.profiles.load_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Match generation aborted, candidates unavailable: {}", e);
                return GenerationReport::aborted(format!("Failed to fetch candidates: {}", e));
            }
        };

        let referrers = match self.profiles.load_referrers().await {
            Ok(referrers) => referrers,
            Err(e) => {
                tracing::error!("Match generation aborted, referrers unavailable: {}", e);
                return GenerationReport::aborted(format!("Failed to fetch referrers: {}", e));
            }
        };

        let candidate_count = candidates.len();
        let referrer_count = referrers.len();

        tracing::info!(
            "Generating matches for {} referrers over {} candidates (top {})",
            referrer_count,
            candidate_count,
            self.options.top_n
        );

        let outcomes = self.process_referrers(referrers, Arc::new(candidates)).await;

        let mut report = GenerationReport {
            referrer_count,
            candidate_count,
            ..GenerationReport::default()
        };

        for outcome in outcomes {
            match outcome {
                Ok(written) => report.matches_inserted += written,
                Err(message) => report.errors.push(message),
            }
        }

        if report.is_success() {
            log_event(
                self.events.as_ref(),
                None,
                MATCH_GENERATED_EVENT,
                json!({
                    "totalMatches": report.matches_inserted,
                    "referrerCount": referrer_count,
                    "candidateCount": candidate_count,
                }),
            )
            .await;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            "Match generation finished: {} rows written, {} referrer errors in {}ms",
            report.matches_inserted,
            report.errors.len(),
            report.duration_ms
        );

        report
    }

    /// Score and upsert each referrer on a bounded set of tasks
    ///
    /// Outcomes come back in referrer order regardless of completion order.
    async fn process_referrers(
        &self,
        referrers: Vec<ReferrerProfile>,
        candidates: Arc<Vec<CandidateProfile>>,
    ) -> Vec<Result<u64, String>> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let top_n = self.options.top_n;

        let handles: Vec<_> = referrers
            .into_iter()
            .map(|referrer| {
                let semaphore = semaphore.clone();
                let candidates = candidates.clone();
                let matches = self.matches.clone();
                let referrer_id = referrer.id.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    upsert_for_referrer(matches.as_ref(), &referrer, &candidates, top_n).await
                });

                (referrer_id, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (referrer_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Match task for referrer {} failed: {}", referrer_id, e);
                    Err(format!("Upsert error for referrer {}: task failed: {}", referrer_id, e))
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

async fn upsert_for_referrer(
    matches: &dyn MatchStore,
    referrer: &ReferrerProfile,
    candidates: &[CandidateProfile],
    top_n: usize,
) -> Result<u64, String> {
    let rows = rank_candidates(referrer, candidates, top_n);
    if rows.is_empty() {
        return Ok(0);
    }

    match matches.upsert_matches(&rows).await {
        Ok(written) => {
            tracing::debug!("Upserted {} matches for referrer {}", written, referrer.id);
            Ok(written)
        }
        Err(e) => {
            tracing::warn!("Upsert failed for referrer {}: {}", referrer.id, e);
            Err(format!("Upsert error for referrer {}: {}", referrer.id, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    fn create_candidate(id: &str, skills: &[&str], impact_score: f64) -> CandidateProfile {
        CandidateProfile {
            id: id.to_string(),
            seniority: "senior".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            domains: vec!["fintech".to_string()],
            intent_role: "SWE".to_string(),
            impact_score,
        }
    }

    fn create_referrer(id: &str) -> ReferrerProfile {
        ReferrerProfile {
            id: id.to_string(),
            seniority: "senior".to_string(),
            prefer_skills: vec!["go".to_string(), "sql".to_string()],
            prefer_domains: vec!["fintech".to_string()],
            refer_roles: vec!["swe".to_string()],
        }
    }

    #[test]
    fn test_rank_sorted_by_score() {
        let candidates = vec![
            create_candidate("low", &[], 10.0),
            create_candidate("high", &["Go", "SQL"], 90.0),
            create_candidate("mid", &["Go"], 50.0),
        ];

        let rows = rank_candidates(&create_referrer("r1"), &candidates, 10);
        let ids: Vec<&str> = rows.iter().map(|r| r.candidate_id.as_str()).collect();

        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert!(rows.iter().all(|r| r.referrer_id == "r1"));
    }

    #[test]
    fn test_rank_ties_broken_by_candidate_id() {
        let candidates = vec![
            create_candidate("c3", &["Go"], 50.0),
            create_candidate("c1", &["Go"], 50.0),
            create_candidate("c2", &["Go"], 50.0),
        ];

        let rows = rank_candidates(&create_referrer("r1"), &candidates, 10);
        let ids: Vec<&str> = rows.iter().map(|r| r.candidate_id.as_str()).collect();

        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_rank_respects_top_n() {
        let candidates: Vec<CandidateProfile> = (0..40)
            .map(|i| create_candidate(&format!("c{:02}", i), &["Go"], i as f64))
            .collect();

        let rows = rank_candidates(&create_referrer("r1"), &candidates, TOP_N_PER_REFERRER);

        assert_eq!(rows.len(), TOP_N_PER_REFERRER);
        assert_eq!(rows[0].candidate_id, "c39");
    }

    #[test]
    fn test_rank_drops_duplicate_candidate_ids() {
        let candidates = vec![
            create_candidate("c1", &["Go", "SQL"], 90.0),
            create_candidate("c1", &[], 10.0),
        ];

        let rows = rank_candidates(&create_referrer("r1"), &candidates, 10);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].score > 0.9);
    }

    #[tokio::test]
    async fn test_generate_writes_and_records_event() {
        let store = Arc::new(MemoryStore::with_profiles(
            vec![create_candidate("c1", &["Go"], 80.0), create_candidate("c2", &[], 20.0)],
            vec![create_referrer("r1"), create_referrer("r2")],
        ));
        let generator = MatchGenerator::from_handles(
            &StoreHandles::from_store("memory", store.clone()),
            GeneratorOptions::default(),
        );

        let report = generator.generate_matches().await;

        assert!(report.is_success());
        assert_eq!(report.matches_inserted, 4);
        assert_eq!(report.referrer_count, 2);
        assert_eq!(report.candidate_count, 2);

        let events = store.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, MATCH_GENERATED_EVENT);
        assert_eq!(events[0].user_id, None);
        assert_eq!(events[0].payload["totalMatches"], 4);
        assert_eq!(events[0].payload["referrerCount"], 2);
        assert_eq!(events[0].payload["candidateCount"], 2);
    }

    #[tokio::test]
    async fn test_generate_uses_configured_top_n() {
        let candidates = (0..5)
            .map(|i| create_candidate(&format!("c{}", i), &["Go"], i as f64 * 10.0))
            .collect();
        let store = Arc::new(MemoryStore::with_profiles(candidates, vec![create_referrer("r1")]));
        let options = GeneratorOptions {
            top_n: 2,
            concurrency: 1,
        };
        let generator =
            MatchGenerator::from_handles(&StoreHandles::from_store("memory", store.clone()), options);

        assert_eq!(generator.options(), options);

        let report = generator.generate_matches().await;
        assert_eq!(report.matches_inserted, 2);

        let mut ids: Vec<String> = store
            .all_matches()
            .unwrap()
            .into_iter()
            .map(|m| m.candidate_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["c3", "c4"]);
    }

    #[tokio::test]
    async fn test_generate_with_no_candidates() {
        let store = Arc::new(MemoryStore::with_profiles(vec![], vec![create_referrer("r1")]));
        let generator = MatchGenerator::from_handles(
            &StoreHandles::from_store("memory", store.clone()),
            GeneratorOptions::default(),
        );

        let report = generator.generate_matches().await;

        assert!(report.is_success());
        assert_eq!(report.matches_inserted, 0);
        assert_eq!(store.events().unwrap().len(), 1);
    }
}
