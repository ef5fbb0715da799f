//! Vouch Match - referral match scoring and generation service
//!
//! Scores every candidate against every referrer, keeps the best matches per
//! referrer and persists them idempotently. The scoring function is pure and
//! usable on its own; generation runs against any store backend.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{compute_score, rank_candidates, GeneratorOptions, MatchGenerator};
pub use models::{
    CandidateProfile, GenerationReport, Match, MatchRow, MatchScore, ReferrerProfile,
    ScoreBreakdown,
};
