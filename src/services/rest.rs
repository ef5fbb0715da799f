use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateProfile, Match, MatchRow, NewEvent, ReferrerProfile};
use crate::services::store::{EventLog, HealthCheck, MatchStore, ProfileStore, StoreError};

/// Errors that can occur when interacting with the REST data API
#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names exposed by the REST data API
#[derive(Debug, Clone)]
pub struct RestTables {
    pub candidate_profiles: String,
    pub referrer_profiles: String,
    pub matches: String,
    pub events: String,
}

impl Default for RestTables {
    fn default() -> Self {
        Self {
            candidate_profiles: "candidate_profiles".to_string(),
            referrer_profiles: "referrer_profiles".to_string(),
            matches: "matches".to_string(),
            events: "events".to_string(),
        }
    }
}

const MATCH_COLUMNS: &str = "id,candidate_id,referrer_id,score,breakdown,created_at";

/// Client for a PostgREST-style data API
///
/// Handles all communication with the hosted database including:
/// - Fetching candidate and referrer profiles
/// - Upserting matches with merge-on-conflict semantics
/// - Appending audit events
pub struct RestStore {
    base_url: String,
    service_key: String,
    client: Client,
    tables: RestTables,
}

impl RestStore {
    /// Create a new REST store client
    pub fn new(
        base_url: String,
        service_key: String,
        tables: RestTables,
        timeout: Duration,
    ) -> Result<Self, RestError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            service_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    /// Fail on non-success statuses, keeping the response body for context
    async fn check(response: Response, action: &str) -> Result<Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RestError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Failed to {}: {} - {}", action, status, body);

        Err(RestError::ApiError(format!("Failed to {}: {} {}", action, status, body)))
    }

    async fn get_rows<T: DeserializeOwned>(&self, url: &str, action: &str) -> Result<Vec<T>, RestError> {
        tracing::debug!("Fetching rows from: {}", url);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = Self::check(response, action).await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RestError::InvalidResponse(format!("Failed to parse rows: {}", e)))
    }

    async fn fetch_matches(
        &self,
        column: &str,
        owner_id: &str,
        tie_break: &str,
        limit: usize,
    ) -> Result<Vec<Match>, RestError> {
        let url = format!(
            "{}?select={}&{}=eq.{}&order=score.desc,{}.asc&limit={}",
            self.table_url(&self.tables.matches),
            MATCH_COLUMNS,
            column,
            urlencoding::encode(owner_id),
            tie_break,
            limit
        );

        self.get_rows(&url, "fetch matches").await
    }
}

/// Parse the total from a `Content-Range` header such as `0-0/42` or `*/0`
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl ProfileStore for RestStore {
    async fn load_candidates(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        let url = format!(
            "{}?select=user_id,seniority,skills,domains,intent_role,impact_score",
            self.table_url(&self.tables.candidate_profiles)
        );

        let candidates: Vec<CandidateProfile> = self.get_rows(&url, "fetch candidates").await?;
        tracing::debug!("Loaded {} candidate profiles", candidates.len());

        Ok(candidates)
    }

    async fn load_referrers(&self) -> Result<Vec<ReferrerProfile>, StoreError> {
        let url = format!(
            "{}?select=user_id,seniority,prefer_skills,prefer_domains,refer_roles",
            self.table_url(&self.tables.referrer_profiles)
        );

        let referrers: Vec<ReferrerProfile> = self.get_rows(&url, "fetch referrers").await?;
        tracing::debug!("Loaded {} referrer profiles", referrers.len());

        Ok(referrers)
    }
}

#[async_trait]
impl MatchStore for RestStore {
    /// Upsert matches with `on_conflict` on the natural key
    ///
    /// `resolution=merge-duplicates` turns conflicting inserts into updates of
    /// the supplied columns only, so `created_at` survives.
    async fn upsert_matches(&self, rows: &[MatchRow]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let url = format!(
            "{}?on_conflict={}",
            self.table_url(&self.tables.matches),
            urlencoding::encode("candidate_id,referrer_id")
        );

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows)
            .send()
            .await
            .map_err(RestError::from)?;
        let response = Self::check(response, "upsert matches").await?;

        let written: Vec<Value> = response
            .json()
            .await
            .map_err(|e| RestError::InvalidResponse(format!("Failed to parse upsert result: {}", e)))?;

        tracing::debug!("Upserted {} match rows", written.len());

        Ok(written.len() as u64)
    }

    async fn matches_for_referrer(
        &self,
        referrer_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .fetch_matches("referrer_id", referrer_id, "candidate_id", limit)
            .await?)
    }

    async fn matches_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .fetch_matches("candidate_id", candidate_id, "referrer_id", limit)
            .await?)
    }

    async fn count_matches(&self) -> Result<u64, StoreError> {
        let url = format!("{}?select=id", self.table_url(&self.tables.matches));

        let response = self
            .authorized(self.client.head(&url))
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(RestError::from)?;
        let response = Self::check(response, "count matches").await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| RestError::InvalidResponse("Missing Content-Range total".into()))?;

        Ok(total)
    }
}

#[async_trait]
impl EventLog for RestStore {
    async fn record_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let url = self.table_url(&self.tables.events);
        let payload = json!({
            "user_id": event.user_id,
            "type": event.event_type,
            "payload": event.payload,
        });

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(&payload)
            .send()
            .await
            .map_err(RestError::from)?;
        Self::check(response, "record event").await?;

        tracing::debug!("Recorded event: {}", event.event_type);

        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RestStore {
    async fn health_check(&self) -> bool {
        let url = format!(
            "{}?select=user_id&limit=1",
            self.table_url(&self.tables.candidate_profiles)
        );

        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("REST store health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_store_creation() {
        let store = RestStore::new(
            "https://db.test/rest/v1/".to_string(),
            "test_key".to_string(),
            RestTables::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(store.table_url("matches"), "https://db.test/rest/v1/matches");
        assert_eq!(store.service_key, "test_key");
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
