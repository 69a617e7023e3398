//! Similarity Source - "More like the books you loved"
//!
//! Generates candidates from the external catalog, seeded by the user's
//! favorite books.
//!
//! ## Algorithm
//! 1. Split the quota evenly over the favorite books (`quota / n + 1` each)
//! 2. For each favorite book, resolve it (store first, then catalog)
//! 3. Search the catalog by its first category, or by its first author
//!    when it has no category
//! 4. Tag every result with the id of the favorite that produced it
//!
//! A favorite that can't be resolved or searched is skipped; the remaining
//! favorites still contribute. Lookups for different favorites run
//! concurrently.

use crate::lookup::BookLookup;
use crate::types::{Candidate, RecommendationReason, UserContext};
use anyhow::Result;
use futures::future::join_all;
use library::Book;
use tracing::{debug, instrument, warn};

/// Catalog query that finds books like `book`
pub fn similarity_query(book: &Book) -> Option<String> {
    if let Some(category) = book.primary_category() {
        return Some(format!("subject:{}", category));
    }
    book.primary_author()
        .map(|author| format!("inauthor:{}", author))
}

/// Similarity source generates candidates similar to the user's favorites
pub struct SimilaritySource {
    lookup: BookLookup,
}

impl SimilaritySource {
    pub fn new(lookup: BookLookup) -> Self {
        Self { lookup }
    }

    /// Generate candidates similar to the user's favorite books
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn get_candidates(&self, context: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        let favorites = &context.profile.favorite_books;
        if limit == 0 || favorites.is_empty() {
            return Ok(Vec::new());
        }

        let per_book = limit / favorites.len() + 1;
        debug!(
            "Generating Similarity candidates from {} favorites ({} each)",
            favorites.len(),
            per_book
        );

        let batches = join_all(
            favorites
                .iter()
                .map(|favorite| self.similar_to(favorite, per_book)),
        )
        .await;

        let candidates: Vec<Candidate> = batches.into_iter().flatten().collect();
        debug!("Generated {} Similarity candidates", candidates.len());
        Ok(candidates)
    }

    async fn similar_to(&self, favorite_id: &str, max_results: usize) -> Vec<Candidate> {
        let favorite = match self.lookup.book(favorite_id).await {
            Ok(Some(book)) => book,
            Ok(None) => {
                debug!("Favorite book {} not found anywhere, skipping", favorite_id);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to resolve favorite book {}: {}", favorite_id, e);
                return Vec::new();
            }
        };

        let Some(query) = similarity_query(&favorite) else {
            debug!("Favorite book {} has no category or author", favorite_id);
            return Vec::new();
        };

        let books = match self.lookup.catalog().search(&query, max_results).await {
            Ok(books) => books,
            Err(e) => {
                warn!("Catalog search {:?} failed: {}", query, e);
                return Vec::new();
            }
        };
        self.lookup.persist(books.clone());

        books
            .into_iter()
            .map(|book| {
                Candidate::new(book, RecommendationReason::SimilarTo(favorite_id.to_string()))
            })
            .collect()
    }
}
