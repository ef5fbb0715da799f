use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{CandidateProfile, ReferrerProfile};

/// Request to score a single candidate/referrer pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScorePairRequest {
    #[validate(nested)]
    pub candidate: CandidateProfile,
    #[validate(nested)]
    pub referrer: ReferrerProfile,
}

/// Query parameters for match listings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListMatchesQuery {
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

impl ListMatchesQuery {
    /// Requested limit, defaulted and capped
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT) as usize
    }
}

pub const DEFAULT_LIST_LIMIT: u16 = 25;
pub const MAX_LIST_LIMIT: u16 = 100;
