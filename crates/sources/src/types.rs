//! Core types for candidate generation.
//!
//! This module defines:
//! - `UserProfile`: a user's taste, derived from their reading history
//! - `UserContext`: the profile plus the set of books the user already logged
//! - `RecommendationReason`: why a book was suggested (one variant per source)
//! - `Candidate`: a book, its reason and its ranking score

use library::{Book, BookId, UserId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Ratings at or above this count as "loved" everywhere in the engine
pub const HIGH_RATING: u8 = 4;

// =============================================================================
// User profile and context
// =============================================================================

/// A user's reading taste.
///
/// Every list is ordered most-significant first. Any of them may be empty
/// (new users, unrated logs, no reviews).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Categories of highly rated books, most frequent first
    pub favorite_categories: Vec<String>,
    /// Authors of highly rated books, most frequent first
    pub favorite_authors: Vec<String>,
    /// Highest rated books, ties broken by most recent log
    pub favorite_books: Vec<BookId>,
    /// Salient words from the user's reviews, duplicates removed per review
    pub review_keywords: Vec<String>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// True when no signal at all is available for this user
    pub fn is_empty(&self) -> bool {
        self.favorite_categories.is_empty()
            && self.favorite_authors.is_empty()
            && self.favorite_books.is_empty()
            && self.review_keywords.is_empty()
    }
}

/// Everything a source needs to know about the requesting user.
///
/// Built once per request and shared read-only by all sources.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,
    pub profile: UserProfile,

    /// Every book the user has a log for, regardless of status
    pub logged_books: HashSet<BookId>,
}

impl UserContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        let user_id = user_id.into();
        Self {
            profile: UserProfile::new(user_id.clone()),
            user_id,
            logged_books: HashSet::new(),
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_logged_books<I, S>(mut self, books: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BookId>,
    {
        self.logged_books = books.into_iter().map(Into::into).collect();
        self
    }

    /// Check if the user already has a log for this book
    pub fn has_logged(&self, book_id: &str) -> bool {
        self.logged_books.contains(book_id)
    }
}

// =============================================================================
// Recommendation reasons
// =============================================================================

/// Why a book was recommended.
///
/// Each candidate source attaches exactly one reason; the variant also fixes
/// the candidate's base score and the reason's confidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "ReasonView")]
pub enum RecommendationReason {
    /// Similar to one of the user's favorite books (the source book's id)
    SimilarTo(BookId),
    /// Loved by this many of the people the user follows
    FriendsLoved(u32),
    /// In one of the user's favorite categories
    FavoriteCategory(String),
    /// Popular across the whole platform
    Trending,
    /// A highly rated book outside the user's usual picks
    Serendipity,
}

impl RecommendationReason {
    /// Wire name of the reason type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SimilarTo(_) => "similar",
            Self::FriendsLoved(_) => "friend",
            Self::FavoriteCategory(_) => "category",
            Self::Trending => "trending",
            Self::Serendipity => "serendipity",
        }
    }

    /// Machine-readable detail (source book id, friend count, category label)
    pub fn value(&self) -> String {
        match self {
            Self::SimilarTo(book_id) => book_id.clone(),
            Self::FriendsLoved(count) => format!("{} friends", count),
            Self::FavoriteCategory(category) => category.clone(),
            Self::Trending => "popular".to_string(),
            Self::Serendipity => "discovery".to_string(),
        }
    }

    /// Confidence in the reason, 0-100
    pub fn confidence(&self) -> u8 {
        match self {
            Self::SimilarTo(_) => 85,
            Self::FriendsLoved(_) => 75,
            Self::FavoriteCategory(_) => 70,
            Self::Trending => 60,
            Self::Serendipity => 50,
        }
    }

    /// Base ranking score of candidates carrying this reason
    pub fn base_score(&self) -> f64 {
        match self {
            Self::SimilarTo(_) => 0.9,
            Self::FriendsLoved(_) => 0.8,
            Self::FavoriteCategory(_) => 0.7,
            Self::Trending => 0.6,
            Self::Serendipity => 0.5,
        }
    }

    /// Human-readable explanation shown next to the book
    pub fn description(&self) -> String {
        match self {
            Self::SimilarTo(_) => "Similar to a book you loved".to_string(),
            Self::FriendsLoved(count) => format!("Loved by {} of your friends", count),
            Self::FavoriteCategory(category) => format!("In {}, a genre you love", category),
            Self::Trending => "Trending on the platform".to_string(),
            Self::Serendipity => "Something different you might love".to_string(),
        }
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Serialized shape of a reason: `{type, value, confidence, description}`
#[derive(Debug, Serialize)]
struct ReasonView {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
    confidence: u8,
    description: String,
}

impl From<RecommendationReason> for ReasonView {
    fn from(reason: RecommendationReason) -> Self {
        Self {
            kind: reason.kind(),
            value: reason.value(),
            confidence: reason.confidence(),
            description: reason.description(),
        }
    }
}

// =============================================================================
// Candidates
// =============================================================================

/// A recommended book with its reason and score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub book: Book,
    pub reason: RecommendationReason,

    /// Ranking score in [0, 1]; set from the reason at creation
    pub score: f64,
}

impl Candidate {
    /// Create a candidate scored by its reason
    pub fn new(book: Book, reason: RecommendationReason) -> Self {
        let score = reason.base_score();
        Self {
            book,
            reason,
            score,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_scored_by_reason() {
        let candidate = Candidate::new(Book::new("b1", "Dune"), RecommendationReason::FriendsLoved(2));
        assert_eq!(candidate.score, 0.8);
        assert_eq!(candidate.book_id(), "b1");
    }

    #[test]
    fn test_reason_scores_are_ordered() {
        let reasons = [
            RecommendationReason::SimilarTo("x".into()),
            RecommendationReason::FriendsLoved(1),
            RecommendationReason::FavoriteCategory("Fantasy".into()),
            RecommendationReason::Trending,
            RecommendationReason::Serendipity,
        ];
        for pair in reasons.windows(2) {
            assert!(pair[0].base_score() > pair[1].base_score());
            assert!(pair[0].confidence() > pair[1].confidence());
        }
    }

    #[test]
    fn test_reason_descriptions() {
        assert_eq!(
            RecommendationReason::FriendsLoved(3).description(),
            "Loved by 3 of your friends"
        );
        assert_eq!(
            RecommendationReason::FavoriteCategory("Fantasy".into()).to_string(),
            "In Fantasy, a genre you love"
        );
    }

    #[test]
    fn test_reason_serialization() {
        let value = serde_json::to_value(RecommendationReason::SimilarTo("b9".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "similar",
                "value": "b9",
                "confidence": 85,
                "description": "Similar to a book you loved"
            })
        );
    }

    #[test]
    fn test_user_context_logged_books() {
        let context = UserContext::new("u1").with_logged_books(["b1", "b2"]);
        assert_eq!(context.profile.user_id, "u1");
        assert!(context.has_logged("b1"));
        assert!(!context.has_logged("b3"));
        assert!(context.profile.is_empty());
    }
}
