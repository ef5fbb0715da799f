// Core algorithm exports
pub mod generator;
pub mod overlap;
pub mod scheduler;
pub mod scoring;
pub mod seniority;

pub use generator::{rank_candidates, GeneratorOptions, MatchGenerator, MATCH_GENERATED_EVENT, TOP_N_PER_REFERRER};
pub use overlap::{contains_ignore_case, overlap_ratio};
pub use scheduler::spawn_periodic_generation;
pub use scoring::{compute_score, round4, SCORE_WEIGHTS};
pub use seniority::{seniority_gap, seniority_level, DEFAULT_SENIORITY_LEVEL};
