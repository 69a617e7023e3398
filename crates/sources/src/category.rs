//! Category Source - "In a genre you love"
//!
//! Picks ONE of the user's favorite categories uniformly at random per call
//! and searches the catalog for it. Rotating the category keeps repeated
//! requests from showing the same shelf.

use crate::lookup::BookLookup;
use crate::types::{Candidate, RecommendationReason, UserContext};
use anyhow::Result;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// Catalog query for books in `category`
pub fn category_query(category: &str) -> String {
    format!("subject:{}", category)
}

/// Category source generates candidates from a favorite category
pub struct CategorySource {
    lookup: BookLookup,
}

impl CategorySource {
    pub fn new(lookup: BookLookup) -> Self {
        Self { lookup }
    }

    /// Generate candidates from one randomly chosen favorite category
    #[instrument(skip(self, context, rng), fields(user_id = %context.user_id))]
    pub async fn get_candidates<R: Rng + Send>(
        &self,
        context: &UserContext,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let Some(category) = context.profile.favorite_categories.choose(rng).cloned() else {
            return Ok(Vec::new());
        };
        debug!("Chose category {:?}", category);

        let books = self
            .lookup
            .catalog()
            .search(&category_query(&category), limit)
            .await?;
        self.lookup.persist(books.clone());

        let candidates: Vec<Candidate> = books
            .into_iter()
            .map(|book| {
                Candidate::new(book, RecommendationReason::FavoriteCategory(category.clone()))
            })
            .collect();

        debug!("Generated {} Category candidates", candidates.len());
        Ok(candidates)
    }
}
