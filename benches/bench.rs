// Criterion benchmarks for Vouch Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vouch_match::core::{compute_score, overlap::overlap_ratio, rank_candidates, TOP_N_PER_REFERRER};
use vouch_match::models::{CandidateProfile, ReferrerProfile};

const SKILLS: [&str; 8] = ["go", "rust", "sql", "kafka", "k8s", "react", "python", "terraform"];
const DOMAINS: [&str; 4] = ["fintech", "health", "ecommerce", "infra"];
const SENIORITIES: [&str; 5] = ["junior", "mid", "senior", "staff", "principal"];

fn create_candidate(id: usize) -> CandidateProfile {
    CandidateProfile {
        id: format!("c{}", id),
        seniority: SENIORITIES[id % SENIORITIES.len()].to_string(),
        skills: (0..3).map(|i| SKILLS[(id + i) % SKILLS.len()].to_string()).collect(),
        domains: vec![DOMAINS[id % DOMAINS.len()].to_string()],
        intent_role: if id % 3 == 0 { "SRE" } else { "SWE" }.to_string(),
        impact_score: (id % 100) as f64,
    }
}

fn create_referrer() -> ReferrerProfile {
    ReferrerProfile {
        id: "r1".to_string(),
        seniority: "senior".to_string(),
        prefer_skills: vec!["go".to_string(), "sql".to_string(), "k8s".to_string()],
        prefer_domains: vec!["fintech".to_string(), "infra".to_string()],
        refer_roles: vec!["swe".to_string()],
    }
}

fn bench_compute_score(c: &mut Criterion) {
    let candidate = create_candidate(7);
    let referrer = create_referrer();

    c.bench_function("compute_score", |b| {
        b.iter(|| compute_score(black_box(&candidate), black_box(&referrer)));
    });
}

fn bench_overlap(c: &mut Criterion) {
    let a: Vec<String> = SKILLS.iter().map(|s| s.to_uppercase()).collect();
    let b: Vec<String> = SKILLS.iter().rev().map(|s| s.to_string()).collect();

    c.bench_function("overlap_ratio", |bench| {
        bench.iter(|| overlap_ratio(black_box(&a), black_box(&b)));
    });
}

fn bench_rank_candidates(c: &mut Criterion) {
    let referrer = create_referrer();
    let mut group = c.benchmark_group("rank_candidates");

    for size in [100, 1000, 10000].iter() {
        let candidates: Vec<CandidateProfile> = (0..*size).map(create_candidate).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| rank_candidates(black_box(&referrer), black_box(&candidates), TOP_N_PER_REFERRER));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_score, bench_overlap, bench_rank_candidates);
criterion_main!(benches);
