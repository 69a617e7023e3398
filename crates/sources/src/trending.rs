//! Trending Source - Platform-wide popularity
//!
//! Books with the most "read" logs, ties broken by average rating. On a
//! fresh platform with no reads yet (or when the trending query fails) it
//! falls back to random books so the anonymous feed is never empty.
//!
//! This is the only source used for anonymous requests, so it needs no
//! user context.

use crate::types::{Candidate, RecommendationReason};
use anyhow::Result;
use library::ReadingStore;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Trending source generates candidates from platform popularity
pub struct TrendingSource {
    store: Arc<dyn ReadingStore>,
}

impl TrendingSource {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let books = match self.store.trending_books(limit).await {
            Ok(books) if !books.is_empty() => books,
            Ok(_) => {
                debug!("No trending books yet, falling back to random books");
                self.store.random_books(limit).await?
            }
            Err(e) => {
                warn!("Trending query failed, falling back to random books: {}", e);
                self.store.random_books(limit).await?
            }
        };

        let candidates: Vec<Candidate> = books
            .into_iter()
            .map(|book| Candidate::new(book, RecommendationReason::Trending))
            .collect();

        debug!("Generated {} Trending candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockStore, sample_library, store_failure};
    use library::Book;

    #[tokio::test]
    async fn test_trending_order() {
        let source = TrendingSource::new(Arc::new(sample_library()));
        let candidates = source.get_candidates(3).await.unwrap();

        let ids: Vec<&str> = candidates.iter().map(|c| c.book_id()).collect();
        assert_eq!(ids, vec!["b4", "b5", "b1"]);
        assert!(candidates.iter().all(|c| c.reason == RecommendationReason::Trending));
        assert_eq!(candidates[0].score, 0.6);
    }

    #[tokio::test]
    async fn test_falls_back_to_random_when_empty() {
        let mut store = MockStore::new();
        store.expect_trending_books().returning(|_| Ok(Vec::new()));
        store
            .expect_random_books()
            .withf(|limit| *limit == 4)
            .times(1)
            .returning(|_| Ok(vec![Book::new("r1", "Random")]));

        let source = TrendingSource::new(Arc::new(store));
        let candidates = source.get_candidates(4).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].book_id(), "r1");
    }

    #[tokio::test]
    async fn test_falls_back_to_random_on_error() {
        let mut store = MockStore::new();
        store
            .expect_trending_books()
            .returning(|_| Err(store_failure()));
        store
            .expect_random_books()
            .returning(|_| Ok(vec![Book::new("r1", "Random")]));

        let source = TrendingSource::new(Arc::new(store));
        assert_eq!(source.get_candidates(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_library() {
        let source = TrendingSource::new(Arc::new(library::MemoryLibrary::new()));
        assert!(source.get_candidates(10).await.unwrap().is_empty());
    }
}
