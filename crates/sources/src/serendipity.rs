//! Serendipity Source - Out-of-network discovery
//!
//! A random draw of well-liked books (average rating >= 3.5 over at least
//! one read) with no relation to the user's profile.

use crate::types::{Candidate, RecommendationReason};
use anyhow::Result;
use library::ReadingStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Serendipity source generates random quality candidates
pub struct SerendipitySource {
    store: Arc<dyn ReadingStore>,

    /// Minimum average rating for a book to be drawn
    min_avg_rating: f64,
}

impl SerendipitySource {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            min_avg_rating: 3.5,
        }
    }

    /// Configure the minimum average rating (default: 3.5)
    pub fn with_min_avg_rating(mut self, rating: f64) -> Self {
        self.min_avg_rating = rating;
        self
    }

    #[instrument(skip(self))]
    pub async fn get_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let books = self
            .store
            .random_quality_books(self.min_avg_rating, limit)
            .await?;

        let candidates: Vec<Candidate> = books
            .into_iter()
            .map(|book| Candidate::new(book, RecommendationReason::Serendipity))
            .collect();

        debug!("Generated {} Serendipity candidates", candidates.len());
        Ok(candidates)
    }
}
