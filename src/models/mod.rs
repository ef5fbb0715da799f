// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateProfile, Event, GenerationReport, Match, MatchRow, MatchScore, NewEvent,
    ReferrerProfile, ScoreBreakdown, ScoringWeights,
};
pub use requests::{ListMatchesQuery, ScorePairRequest};
pub use responses::{ErrorResponse, HealthResponse, ListMatchesResponse, ScorePairResponse};
