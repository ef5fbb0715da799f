use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder, ResponseError};
use std::future::Future;
use std::sync::Arc;
use validator::Validate;

use crate::core::{compute_score, MatchGenerator};
use crate::models::{
    HealthResponse, ListMatchesQuery, ListMatchesResponse, Match,
    ScorePairRequest, ScorePairResponse,
};
use crate::routes::ApiError;
use crate::services::{CacheError, CacheKey, CacheManager, StoreError, StoreHandles};

/// Header carrying the admin key for administrative endpoints
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub generator: MatchGenerator,
    pub stores: StoreHandles,
    pub cache: Arc<CacheManager>,
    pub admin_key: Option<String>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/generate", web::post().to(generate_matches))
        .route("/matches/score", web::post().to(score_pair))
        .route("/referrers/{referrer_id}/matches", web::get().to(referrer_matches))
        .route("/candidates/{candidate_id}/matches", web::get().to(candidate_matches));
}

fn error_response(status: StatusCode, error: &str, message: String) -> HttpResponse {
    ApiError::new(status, error, message).error_response()
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_connected = state.stores.health.health_check().await;
    let status = if store_connected { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        backend: state.stores.backend.to_string(),
        store_connected,
    })
}

/// Generate matches endpoint
///
/// POST /api/v1/matches/generate
///
/// Runs a full generation pass and returns the report. Partial failures are
/// reported in `errors` with a 200 status.
async fn generate_matches(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(expected) = &state.admin_key {
        let provided = req
            .headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected.as_str()) {
            tracing::info!("Rejected match generation request without a valid admin key");
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                format!("A valid {} header is required", ADMIN_KEY_HEADER),
            );
        }
    }

    let report = state.generator.generate_matches().await;

    if let Err(e) = state.cache.invalidate_matches().await {
        tracing::warn!("Failed to invalidate match cache: {}", e);
    }

    HttpResponse::Ok().json(report)
}

/// Score a single pair endpoint
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "candidate": { "userId": "string", "seniority": "senior", "skills": [], "domains": [], "intentRole": "SWE", "impactScore": 80 },
///   "referrer": { "userId": "string", "seniority": "senior", "preferSkills": [], "preferDomains": [], "referRoles": [] }
/// }
/// ```
async fn score_pair(req: web::Json<ScorePairRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let score = compute_score(&req.candidate, &req.referrer);

    HttpResponse::Ok().json(ScorePairResponse {
        candidate_id: req.candidate.id.clone(),
        referrer_id: req.referrer.id.clone(),
        total_score: score.total_score,
        breakdown: score.breakdown,
    })
}

/// Matches for a referrer
///
/// GET /api/v1/referrers/{referrerId}/matches?limit=25
async fn referrer_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListMatchesQuery>,
) -> impl Responder {
    let referrer_id = path.into_inner();
    let limit = match validated_limit(&query) {
        Ok(limit) => limit,
        Err(response) => return response,
    };
    let key = CacheKey::referrer_matches(&referrer_id, limit);
    let matches = state.stores.matches.clone();

    cached_listing(&state.cache, &key, || async move {
        matches.matches_for_referrer(&referrer_id, limit).await
    })
    .await
}

/// Matches for a candidate
///
/// GET /api/v1/candidates/{candidateId}/matches?limit=25
async fn candidate_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListMatchesQuery>,
) -> impl Responder {
    let candidate_id = path.into_inner();
    let limit = match validated_limit(&query) {
        Ok(limit) => limit,
        Err(response) => return response,
    };
    let key = CacheKey::candidate_matches(&candidate_id, limit);
    let matches = state.stores.matches.clone();

    cached_listing(&state.cache, &key, || async move {
        matches.matches_for_candidate(&candidate_id, limit).await
    })
    .await
}

fn validated_limit(query: &ListMatchesQuery) -> Result<usize, HttpResponse> {
    query.validate().map_err(|errors| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        )
    })?;

    Ok(query.effective_limit())
}

/// Serve a listing from cache, falling back to the store and repopulating
async fn cached_listing<F, Fut>(cache: &CacheManager, key: &str, load: F) -> HttpResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Match>, StoreError>>,
{
    match cache.get::<Vec<Match>>(key).await {
        Ok(matches) => return listing_response(matches),
        Err(CacheError::CacheMiss(_)) => {}
        Err(e) => tracing::warn!("Cache read failed for {}, using store: {}", key, e),
    }

    let epoch = cache.epoch();

    match load().await {
        Ok(matches) => {
            match cache.set_if_current(key, &matches, epoch).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Matches changed while loading {}, not cached", key),
                Err(e) => tracing::warn!("Failed to cache {}: {}", key, e),
            }
            listing_response(matches)
        }
        Err(e) => {
            tracing::error!("Failed to fetch matches for {}: {}", key, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch matches",
                e.to_string(),
            )
        }
    }
}

fn listing_response(matches: Vec<Match>) -> HttpResponse {
    let total = matches.len();
    HttpResponse::Ok().json(ListMatchesResponse { matches, total })
}
