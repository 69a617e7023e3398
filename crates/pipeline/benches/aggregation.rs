//! Benchmarks for candidate aggregation
//!
//! Run with: cargo bench --package pipeline
//!
//! Aggregates a synthetic feed the size of a large request (five sources,
//! heavy overlap, a long reading history).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use library::{Book, BookId};
use pipeline::Aggregator;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sources::{Candidate, RecommendationReason};
use std::collections::HashSet;

fn synthetic_candidates(per_source: usize) -> Vec<Candidate> {
    let reasons = [
        RecommendationReason::SimilarTo("fav".to_string()),
        RecommendationReason::FriendsLoved(3),
        RecommendationReason::FavoriteCategory("Fiction".to_string()),
        RecommendationReason::Trending,
        RecommendationReason::Serendipity,
    ];

    let mut candidates = Vec::with_capacity(per_source * reasons.len());
    for (offset, reason) in reasons.iter().enumerate() {
        for i in 0..per_source {
            // Neighbouring sources share half their books
            let id = format!("book-{}", offset * per_source / 2 + i);
            candidates.push(Candidate::new(Book::new(id.clone(), id), reason.clone()));
        }
    }
    candidates
}

fn bench_dedupe_and_rank(c: &mut Criterion) {
    let aggregator = Aggregator::new();
    let candidates = synthetic_candidates(200);
    let logged: HashSet<BookId> = (0..500).map(|i| format!("book-{}", i * 3)).collect();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("dedupe_and_rank_1000", |b| {
        b.iter(|| {
            let feed = aggregator
                .dedupe_and_rank(black_box(candidates.clone()), black_box(&logged), 20, &mut rng)
                .unwrap();
            black_box(feed)
        })
    });
}

criterion_group!(benches, bench_dedupe_and_rank);
criterion_main!(benches);
