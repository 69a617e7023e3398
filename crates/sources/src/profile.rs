//! Build a [`UserProfile`] and [`UserContext`] from the reading store.
//!
//! The profile aggregates everything the sources need up front:
//! - Favorite categories and authors (from books rated >= 4)
//! - Favorite books (highest rated, most recent first)
//! - Keywords pulled from the user's written reviews
//!
//! Each store query runs concurrently. A failed query only empties its own
//! part of the profile; profile building itself never fails.

use crate::types::{HIGH_RATING, UserContext, UserProfile};
use library::ReadingStore;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument, warn};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word pattern"));

/// Common words that carry no taste signal
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "this", "that", "these", "those", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
];

/// Builds user profiles and per-request contexts
pub struct ProfileBuilder {
    store: Arc<dyn ReadingStore>,

    /// Minimum rating for a book to count as a favorite
    min_rating: u8,

    max_categories: usize,
    max_authors: usize,
    max_favorite_books: usize,
    max_reviews: usize,
    keywords_per_review: usize,
}

impl ProfileBuilder {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            min_rating: HIGH_RATING,
            max_categories: 10,
            max_authors: 5,
            max_favorite_books: 5,
            max_reviews: 20,
            keywords_per_review: 10,
        }
    }

    /// Configure how many favorite books are kept (default: 5)
    pub fn with_max_favorite_books(mut self, max: usize) -> Self {
        self.max_favorite_books = max;
        self
    }

    /// Configure how many reviews are mined for keywords (default: 20)
    pub fn with_max_reviews(mut self, max: usize) -> Self {
        self.max_reviews = max;
        self
    }

    /// Assemble the user's taste profile
    #[instrument(skip(self))]
    pub async fn build_profile(&self, user_id: &str) -> UserProfile {
        let (categories, authors, books, reviews) = tokio::join!(
            self.store
                .favorite_categories(user_id, self.min_rating, self.max_categories),
            self.store
                .favorite_authors(user_id, self.min_rating, self.max_authors),
            self.store
                .favorite_books(user_id, self.min_rating, self.max_favorite_books),
            self.store.reviews(user_id, self.max_reviews),
        );

        let mut profile = UserProfile::new(user_id);
        profile.favorite_categories = or_empty("favorite categories", user_id, categories)
            .into_iter()
            .map(|affinity| affinity.label)
            .collect();
        profile.favorite_authors = or_empty("favorite authors", user_id, authors)
            .into_iter()
            .map(|affinity| affinity.label)
            .collect();
        profile.favorite_books = or_empty("favorite books", user_id, books)
            .into_iter()
            .map(|favorite| favorite.book_id)
            .collect();
        profile.review_keywords = or_empty("reviews", user_id, reviews)
            .iter()
            .flat_map(|review| extract_keywords(review, self.keywords_per_review))
            .collect();

        debug!(
            "Profile for {}: {} categories, {} authors, {} favorite books, {} keywords",
            user_id,
            profile.favorite_categories.len(),
            profile.favorite_authors.len(),
            profile.favorite_books.len(),
            profile.review_keywords.len()
        );
        profile
    }

    /// Build the full per-request context: profile plus logged books
    #[instrument(skip(self))]
    pub async fn build_context(&self, user_id: &str) -> UserContext {
        let (profile, logged) = tokio::join!(
            self.build_profile(user_id),
            self.store.logged_book_ids(user_id),
        );

        let mut context = UserContext::new(user_id).with_profile(profile);
        context.logged_books = logged.unwrap_or_else(|e| {
            warn!("Failed to load logged books for user {}: {}", user_id, e);
            HashSet::new()
        });
        context
    }
}

fn or_empty<T>(what: &str, user_id: &str, result: library::Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Failed to load {} for user {}: {}", what, user_id, e);
        Vec::new()
    })
}

/// Pull up to `max` salient words out of one review.
///
/// Words are lowercased; stop words and words of three characters or fewer
/// are dropped; each word appears once, in order of first occurrence.
pub fn extract_keywords(review: &str, max: usize) -> Vec<String> {
    let lowered = review.to_lowercase();
    let mut seen = HashSet::new();

    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.len() > 3 && !STOP_WORDS.contains(word))
        .filter(|word| seen.insert(*word))
        .take(max)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockStore, sample_library, store_failure};

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("The Dragons were AMAZING, and the dragons' lair too!", 10);
        assert_eq!(keywords, vec!["dragons", "amazing", "lair"]);
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_short_words() {
        let keywords = extract_keywords("this would have been those with them their plot", 10);
        assert_eq!(keywords, vec!["plot"]);
        assert!(extract_keywords("", 10).is_empty());
    }

    #[test]
    fn test_extract_keywords_cap() {
        let review = "alpha bravo charlie delta echoes foxtrot golf hotel india juliet kilo lima";
        let keywords = extract_keywords(review, 10);
        assert_eq!(keywords.len(), 10);
        assert_eq!(keywords[0], "alpha");
        assert!(!keywords.contains(&"kilo".to_string()));
    }

    #[tokio::test]
    async fn test_build_profile() {
        let builder = ProfileBuilder::new(Arc::new(sample_library()));
        let profile = builder.build_profile("reader").await;

        assert_eq!(profile.user_id, "reader");
        assert_eq!(profile.favorite_categories[0], "Science Fiction");
        assert!(profile.favorite_categories.contains(&"Classics".to_string()));
        assert_eq!(profile.favorite_books, vec!["b1", "b2"]);
        assert!(profile.favorite_authors.contains(&"Frank Herbert".to_string()));
        assert!(!profile.favorite_authors.contains(&"Jane Austen".to_string()));
        assert!(profile.review_keywords.contains(&"desert".to_string()));
        assert!(profile.review_keywords.contains(&"spice".to_string()));
    }

    #[tokio::test]
    async fn test_build_context_for_unknown_user() {
        let builder = ProfileBuilder::new(Arc::new(sample_library()));
        let context = builder.build_context("stranger").await;

        assert_eq!(context.user_id, "stranger");
        assert!(context.profile.is_empty());
        assert!(context.logged_books.is_empty());
    }

    #[tokio::test]
    async fn test_build_context_includes_all_logged_books() {
        let builder = ProfileBuilder::new(Arc::new(sample_library()));
        let context = builder.build_context("reader").await;

        assert_eq!(context.logged_books.len(), 3);
        assert!(context.has_logged("b3"));
    }

    #[tokio::test]
    async fn test_failed_queries_degrade_to_empty() {
        let mut store = MockStore::new();
        store
            .expect_favorite_categories()
            .returning(|_, _, _| Err(store_failure()));
        store.expect_favorite_authors().returning(|_, _, _| {
            Ok(vec![library::Affinity {
                label: "Ursula K. Le Guin".to_string(),
                count: 3,
                avg_rating: 4.7,
            }])
        });
        store
            .expect_favorite_books()
            .returning(|_, _, _| Err(store_failure()));
        store.expect_reviews().returning(|_, _| Ok(Vec::new()));
        store
            .expect_logged_book_ids()
            .returning(|_| Err(store_failure()));

        let builder = ProfileBuilder::new(Arc::new(store));
        let context = builder.build_context("u1").await;

        assert!(context.profile.favorite_categories.is_empty());
        assert!(context.profile.favorite_books.is_empty());
        assert_eq!(context.profile.favorite_authors, vec!["Ursula K. Le Guin"]);
        assert!(context.logged_books.is_empty());
    }
}
