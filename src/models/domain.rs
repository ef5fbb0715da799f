use serde::{Deserialize, Serialize};
use validator::Validate;

/// Job-seeker attributes used for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CandidateProfile {
    #[validate(length(min = 1))]
    #[serde(rename = "userId", alias = "user_id")]
    pub id: String,
    #[serde(default = "default_seniority")]
    pub seniority: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(rename = "intentRole", alias = "intent_role", default)]
    pub intent_role: String,
    #[serde(rename = "impactScore", alias = "impact_score", default)]
    pub impact_score: f64,
}

/// Referrer preferences used for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReferrerProfile {
    #[validate(length(min = 1))]
    #[serde(rename = "userId", alias = "user_id")]
    pub id: String,
    #[serde(default = "default_seniority")]
    pub seniority: String,
    #[serde(rename = "preferSkills", alias = "prefer_skills", default)]
    pub prefer_skills: Vec<String>,
    #[serde(rename = "preferDomains", alias = "prefer_domains", default)]
    pub prefer_domains: Vec<String>,
    #[serde(rename = "referRoles", alias = "refer_roles", default)]
    pub refer_roles: Vec<String>,
}

fn default_seniority() -> String {
    "mid".to_string()
}

/// Per-factor sub-scores, each in [0, 1]
///
/// Stored verbatim (camelCase keys) in the `breakdown` column so clients can
/// explain a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub role_alignment: f64,
    pub risk_reduction: f64,
    pub intent_fit: f64,
}

/// Result of scoring one candidate against one referrer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Persisted match between a candidate and a referrer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: uuid::Uuid,
    #[serde(rename = "candidateId", alias = "candidate_id")]
    pub candidate_id: String,
    #[serde(rename = "referrerId", alias = "referrer_id")]
    pub referrer_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row written by an upsert, keyed on `(candidate_id, referrer_id)`
///
/// Field names follow the `matches` table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub candidate_id: String,
    pub referrer_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Audit log entry to be appended to the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Audit log entry as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: uuid::Uuid,
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Weights applied to the breakdown when combining the total score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub role_alignment: f64,
    pub risk_reduction: f64,
    pub intent_fit: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            role_alignment: 0.5,
            risk_reduction: 0.3,
            intent_fit: 0.2,
        }
    }
}

/// Outcome of one match generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub matches_inserted: u64,
    pub errors: Vec<String>,
    pub referrer_count: usize,
    pub candidate_count: usize,
    pub duration_ms: u64,
}

impl GenerationReport {
    /// Report for a run that aborted before writing anything
    pub fn aborted(error: String) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_accepts_storage_columns() {
        let json = r#"{
            "user_id": "c1",
            "seniority": "senior",
            "skills": ["Go"],
            "domains": [],
            "intent_role": "SWE",
            "impact_score": 72.5
        }"#;

        let candidate: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.id, "c1");
        assert_eq!(candidate.intent_role, "SWE");
        assert_eq!(candidate.impact_score, 72.5);
    }

    #[test]
    fn test_referrer_defaults() {
        let referrer: ReferrerProfile = serde_json::from_str(r#"{"userId": "r1"}"#).unwrap();
        assert_eq!(referrer.seniority, "mid");
        assert!(referrer.prefer_skills.is_empty());
        assert!(referrer.refer_roles.is_empty());
    }

    #[test]
    fn test_breakdown_uses_camel_case_keys() {
        let breakdown = ScoreBreakdown {
            role_alignment: 1.0,
            risk_reduction: 0.96,
            intent_fit: 1.0,
        };

        let value = serde_json::to_value(breakdown).unwrap();
        assert_eq!(value["roleAlignment"], 1.0);
        assert_eq!(value["riskReduction"], 0.96);
        assert_eq!(value["intentFit"], 1.0);
    }

    #[test]
    fn test_aborted_report() {
        let report = GenerationReport::aborted("boom".to_string());
        assert_eq!(report.matches_inserted, 0);
        assert_eq!(report.errors, vec!["boom"]);
        assert!(!report.is_success());
    }
}
