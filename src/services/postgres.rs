use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateProfile, Match, MatchRow, NewEvent, ReferrerProfile, ScoreBreakdown};
use crate::services::store::{EventLog, HealthCheck, MatchStore, ProfileStore, StoreError};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// PostgreSQL-backed profile, match and event store
///
/// Reads the `candidate_profiles` and `referrer_profiles` tables and owns
/// the `matches` and `events` tables created by the bundled migrations.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn fetch_matches(
        &self,
        column: MatchOwner,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, PostgresError> {
        let query = match column {
            MatchOwner::Referrer => {
                r#"
                SELECT id, candidate_id, referrer_id, score, breakdown, created_at
                FROM matches
                WHERE referrer_id = $1
                ORDER BY score DESC, candidate_id ASC
                LIMIT $2
            "#
            }
            MatchOwner::Candidate => {
                r#"
                SELECT id, candidate_id, referrer_id, score, breakdown, created_at
                FROM matches
                WHERE candidate_id = $1
                ORDER BY score DESC, referrer_id ASC
                LIMIT $2
            "#
            }
        };

        let rows = sqlx::query(query)
            .bind(owner_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }
}

/// Postgres caps a statement at 65 535 bind parameters; each row binds 4
const MATCH_BIND_PARAMS: usize = 4;
const UPSERT_CHUNK_ROWS: usize = u16::MAX as usize / MATCH_BIND_PARAMS;

#[derive(Debug, Clone, Copy)]
enum MatchOwner {
    Referrer,
    Candidate,
}

fn match_from_row(row: &PgRow) -> Result<Match, PostgresError> {
    let breakdown: Json<ScoreBreakdown> = row.try_get("breakdown")?;

    Ok(Match {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        referrer_id: row.try_get("referrer_id")?,
        score: row.try_get("score")?,
        breakdown: breakdown.0,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn load_candidates(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        let query = r#"
            SELECT user_id, seniority, skills, domains, intent_role, impact_score
            FROM candidate_profiles
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let candidates = rows
            .iter()
            .map(|row| {
                Ok(CandidateProfile {
                    id: row.try_get("user_id")?,
                    seniority: row.try_get("seniority")?,
                    skills: row.try_get("skills")?,
                    domains: row.try_get("domains")?,
                    intent_role: row.try_get("intent_role")?,
                    impact_score: row.try_get("impact_score")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(PostgresError::from)?;

        tracing::debug!("Loaded {} candidate profiles", candidates.len());

        Ok(candidates)
    }

    async fn load_referrers(&self) -> Result<Vec<ReferrerProfile>, StoreError> {
        let query = r#"
            SELECT user_id, seniority, prefer_skills, prefer_domains, refer_roles
            FROM referrer_profiles
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let referrers = rows
            .iter()
            .map(|row| {
                Ok(ReferrerProfile {
                    id: row.try_get("user_id")?,
                    seniority: row.try_get("seniority")?,
                    prefer_skills: row.try_get("prefer_skills")?,
                    prefer_domains: row.try_get("prefer_domains")?,
                    refer_roles: row.try_get("refer_roles")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(PostgresError::from)?;

        tracing::debug!("Loaded {} referrer profiles", referrers.len());

        Ok(referrers)
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    /// Upsert a batch of matches
    ///
    /// Uses INSERT ... ON CONFLICT so re-running generation refreshes the
    /// score and breakdown of existing pairs and leaves created_at alone.
    /// Large batches are split to stay under the bind parameter limit and
    /// committed in one transaction.
    async fn upsert_matches(&self, rows: &[MatchRow]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(PostgresError::from)?;
        let mut written = 0;

        for chunk in rows.chunks(UPSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO matches (candidate_id, referrer_id, score, breakdown) ");

            builder.push_values(chunk, |mut values, row| {
                values
                    .push_bind(row.candidate_id.as_str())
                    .push_bind(row.referrer_id.as_str())
                    .push_bind(row.score)
                    .push_bind(Json(row.breakdown));
            });

            builder.push(
                " ON CONFLICT (candidate_id, referrer_id) DO UPDATE SET \
                 score = EXCLUDED.score, \
                 breakdown = EXCLUDED.breakdown",
            );

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(PostgresError::from)?;

            written += result.rows_affected();
        }

        tx.commit().await.map_err(PostgresError::from)?;

        tracing::debug!("Upserted {} match rows", written);

        Ok(written)
    }

    async fn matches_for_referrer(
        &self,
        referrer_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self.fetch_matches(MatchOwner::Referrer, referrer_id, limit).await?)
    }

    async fn matches_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self.fetch_matches(MatchOwner::Candidate, candidate_id, limit).await?)
    }

    async fn count_matches(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM matches")
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let total: i64 = row.try_get("total").map_err(PostgresError::from)?;

        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl EventLog for PostgresClient {
    async fn record_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO events (user_id, type, payload)
            VALUES ($1, $2, $3)
        "#;

        sqlx::query(query)
            .bind(&event.user_id)
            .bind(&event.event_type)
            .bind(Json(&event.payload))
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        tracing::debug!("Recorded event: {}", event.event_type);

        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PostgresClient {
    /// Health check for the database connection
    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
