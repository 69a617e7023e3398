//! Merge, rank and trim candidate lists into the final feed.
//!
//! ## Algorithm
//! 1. Drop books the user already logged
//! 2. Drop repeated books, keeping the first occurrence in source order
//! 3. Stable sort by score descending (ties keep input order)
//! 4. Truncate to `limit`
//! 5. Shuffle the top 3 among themselves when there are more than 3
//!
//! Step 5 only varies presentation: the set of books returned and every
//! position past the head stay exactly as ranked.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyLoggedFilter, DuplicateFilter};
use anyhow::Result;
use library::BookId;
use rand::Rng;
use rand::seq::SliceRandom;
use sources::Candidate;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of leading positions reshuffled on every call
pub const PERTURBED_HEAD: usize = 3;

/// Deduplicates and ranks candidates from all sources
pub struct Aggregator {
    filters: FilterPipeline,
    perturbed_head: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            filters: FilterPipeline::new()
                .add_filter(AlreadyLoggedFilter)
                .add_filter(DuplicateFilter),
            perturbed_head: PERTURBED_HEAD,
        }
    }

    /// Configure how many leading positions are shuffled (default: 3)
    pub fn with_perturbed_head(mut self, head: usize) -> Self {
        self.perturbed_head = head;
        self
    }

    /// Produce the final, ordered recommendation list.
    ///
    /// `candidates` must be concatenated in source order; that order decides
    /// which duplicate survives and how equal scores are ranked.
    #[instrument(skip_all, fields(candidates = candidates.len(), limit = limit))]
    pub fn dedupe_and_rank<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Candidate>,
        logged_books: &HashSet<BookId>,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>> {
        let mut ranked = self.filters.apply(candidates, logged_books)?;

        rank_by_score(&mut ranked);
        ranked.truncate(limit);
        perturb_head(&mut ranked, self.perturbed_head, rng);

        debug!("Aggregated {} recommendations", ranked.len());
        Ok(ranked)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable sort by score, highest first
pub fn rank_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Shuffle the first `head` entries among themselves.
///
/// Only applies when the list is longer than `head`; shorter lists are left
/// in ranked order.
pub fn perturb_head<T, R: Rng + ?Sized>(items: &mut [T], head: usize, rng: &mut R) {
    if items.len() > head {
        items[..head].shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use library::Book;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sources::RecommendationReason;

    fn candidate(id: &str, reason: RecommendationReason) -> Candidate {
        Candidate::new(Book::new(id, id.to_uppercase()), reason)
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.book_id()).collect()
    }

    #[test]
    fn test_rank_is_stable() {
        let mut candidates = vec![
            candidate("t1", RecommendationReason::Trending),
            candidate("c1", RecommendationReason::FavoriteCategory("Poetry".into())),
            candidate("t2", RecommendationReason::Trending),
            candidate("c2", RecommendationReason::FavoriteCategory("Poetry".into())),
        ];
        rank_by_score(&mut candidates);
        assert_eq!(ids(&candidates), vec!["c1", "c2", "t1", "t2"]);
    }

    #[test]
    fn test_perturb_head_only_when_longer() {
        let mut rng = StdRng::seed_from_u64(3);

        let mut short = vec![1, 2, 3];
        perturb_head(&mut short, 3, &mut rng);
        assert_eq!(short, vec![1, 2, 3]);

        for _ in 0..20 {
            let mut long = vec![1, 2, 3, 4, 5];
            perturb_head(&mut long, 3, &mut rng);
            let mut head = long[..3].to_vec();
            head.sort();
            assert_eq!(head, vec![1, 2, 3]);
            assert_eq!(&long[3..], &[4, 5]);
        }
    }

    #[test]
    fn test_head_order_varies() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut heads = HashSet::new();
        for _ in 0..50 {
            let mut items = vec![1, 2, 3, 4];
            perturb_head(&mut items, 3, &mut rng);
            heads.insert(items[..3].to_vec());
        }
        assert!(heads.len() > 1);
    }

    #[test]
    fn test_dedupe_and_rank() {
        let aggregator = Aggregator::new();
        let logged: HashSet<BookId> = ["logged".to_string()].into_iter().collect();
        let candidates = vec![
            candidate("s1", RecommendationReason::SimilarTo("fav".into())),
            candidate("f1", RecommendationReason::FriendsLoved(2)),
            candidate("logged", RecommendationReason::Trending),
            candidate("f1", RecommendationReason::Trending),
            candidate("x1", RecommendationReason::Serendipity),
            candidate("t1", RecommendationReason::Trending),
        ];

        let mut rng = StdRng::seed_from_u64(5);
        let result = aggregator
            .dedupe_and_rank(candidates, &logged, 10, &mut rng)
            .unwrap();

        assert_eq!(result.len(), 4);
        let mut head = ids(&result[..3]);
        head.sort();
        assert_eq!(head, vec!["f1", "s1", "t1"]);
        assert_eq!(result[3].book_id(), "x1");

        let f1 = result.iter().find(|c| c.book_id() == "f1").unwrap();
        assert_eq!(f1.reason, RecommendationReason::FriendsLoved(2));
    }

    #[test]
    fn test_truncates_before_perturbing() {
        let aggregator = Aggregator::new().with_perturbed_head(0);
        let candidates = vec![
            candidate("x1", RecommendationReason::Serendipity),
            candidate("t1", RecommendationReason::Trending),
            candidate("s1", RecommendationReason::SimilarTo("fav".into())),
        ];

        let mut rng = StdRng::seed_from_u64(5);
        let result = aggregator
            .dedupe_and_rank(candidates, &HashSet::new(), 2, &mut rng)
            .unwrap();
        assert_eq!(ids(&result), vec!["s1", "t1"]);
    }

    #[test]
    fn test_zero_limit() {
        let mut rng = StdRng::seed_from_u64(5);
        let result = Aggregator::new()
            .dedupe_and_rank(
                vec![candidate("t1", RecommendationReason::Trending)],
                &HashSet::new(),
                0,
                &mut rng,
            )
            .unwrap();
        assert!(result.is_empty());
    }
}
