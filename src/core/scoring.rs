use crate::models::{CandidateProfile, MatchScore, ReferrerProfile, ScoreBreakdown, ScoringWeights};
use crate::core::{
    overlap::{contains_ignore_case, overlap_ratio},
    seniority::seniority_gap,
};

/// Weights used to combine the breakdown into the total score
///
/// Fixed so that scores persisted by different runs stay comparable.
pub const SCORE_WEIGHTS: ScoringWeights = ScoringWeights {
    role_alignment: 0.5,
    risk_reduction: 0.3,
    intent_fit: 0.2,
};

const DOMAIN_BONUS: f64 = 0.15;
const INTENT_MISMATCH_PENALTY: f64 = 0.3;
const INTENT_MISMATCH_GAP: u8 = 2;

/// Calculate the compatibility score (0-1) of a candidate for a referrer
///
/// Scoring formula:
/// total = round4(
///     role_alignment * 0.5 +    # skills, domains, seniority proximity
///     risk_reduction * 0.3 +    # impact, seniority consistency, domain depth
///     intent_fit * 0.2          # candidate's target role is one the referrer refers for
/// )
///
/// Each sub-score is clamped to [0, 1] before weighting and rounded to four
/// decimals in the breakdown. The total is computed from the unrounded
/// sub-scores.
pub fn compute_score(candidate: &CandidateProfile, referrer: &ReferrerProfile) -> MatchScore {
    let gap = seniority_gap(&candidate.seniority, &referrer.seniority);
    let domain_overlap = overlap_ratio(&candidate.domains, &referrer.prefer_domains);

    let role_alignment = role_alignment(candidate, referrer, gap, domain_overlap);
    let risk_reduction = risk_reduction(candidate, gap, domain_overlap);
    let intent_fit = intent_fit(candidate, referrer, gap);

    let total = role_alignment * SCORE_WEIGHTS.role_alignment
        + risk_reduction * SCORE_WEIGHTS.risk_reduction
        + intent_fit * SCORE_WEIGHTS.intent_fit;

    MatchScore {
        total_score: round4(total),
        breakdown: ScoreBreakdown {
            role_alignment: round4(role_alignment),
            risk_reduction: round4(risk_reduction),
            intent_fit: round4(intent_fit),
        },
    }
}

/// Skill overlap, any shared domain, and seniority proximity
#[inline]
fn role_alignment(
    candidate: &CandidateProfile,
    referrer: &ReferrerProfile,
    gap: u8,
    domain_overlap: f64,
) -> f64 {
    let skill_overlap = overlap_ratio(&candidate.skills, &referrer.prefer_skills);
    let domain_bonus = if domain_overlap > 0.0 { DOMAIN_BONUS } else { 0.0 };
    let seniority_compat = (1.0 - gap as f64 * 0.25).max(0.0);

    clamp_unit(skill_overlap * 0.5 + domain_bonus + seniority_compat * 0.35)
}

/// Demonstrated impact plus how closely the seniorities and domains line up
#[inline]
fn risk_reduction(candidate: &CandidateProfile, gap: u8, domain_overlap: f64) -> f64 {
    let impact = clamp_unit(candidate.impact_score / 100.0);
    let seniority_consistency = (1.0 - gap as f64 * 0.3).max(0.0);

    clamp_unit(impact * 0.4 + seniority_consistency * 0.3 + domain_overlap * 0.3)
}

/// Whether the referrer refers for the candidate's target role
#[inline]
fn intent_fit(candidate: &CandidateProfile, referrer: &ReferrerProfile, gap: u8) -> f64 {
    let role_match = if contains_ignore_case(&referrer.refer_roles, &candidate.intent_role) {
        1.0
    } else {
        0.0
    };
    let penalty = if gap > INTENT_MISMATCH_GAP {
        INTENT_MISMATCH_PENALTY
    } else {
        0.0
    };

    clamp_unit(role_match - penalty)
}

/// Clamp to [0, 1]; NaN becomes 0
#[inline]
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Round to four decimal places, half away from zero
///
/// Rounds the exact stored value: 0.39425 is stored just below the half and
/// becomes 0.3942. Scaling by 10 000 first would round it up. Exact halves
/// can only be odd multiples of 1/32 and are detected separately, since
/// `{:.4}` breaks ties to even.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let thirty_seconds = value.abs() * 32.0;
    if thirty_seconds.fract() == 0.0 && thirty_seconds % 2.0 == 1.0 {
        return (value.abs() * 10_000.0).ceil().copysign(value) / 10_000.0;
    }

    format!("{:.4}", value).parse().unwrap_or(value)
}
