//! # Sources Crate
//!
//! Candidate generation for book recommendations.
//!
//! ## Components
//!
//! ### Profile
//! [`ProfileBuilder`] turns a user's reading history into a [`UserProfile`]
//! (favorite categories, authors, books and review keywords) and wraps it
//! with the set of already-logged books into a [`UserContext`].
//!
//! ### Candidate Sources
//! Five independent strategies, each producing `(book, reason, score)`:
//! - **Similarity** (0.9): catalog books like the user's favorites
//! - **Friend** (0.8): books loved by people the user follows
//! - **Category** (0.7): catalog books from one random favorite category
//! - **Trending** (0.6): most-read books on the platform
//! - **Serendipity** (0.5): random well-rated books
//!
//! Sources that depend on the catalog go through [`BookLookup`], which
//! prefers local rows and caches catalog results in the background.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{BookLookup, ProfileBuilder, TrendingSource};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ReadingStore> = Arc::new(MemoryLibrary::load_from_file(path)?);
//! let context = ProfileBuilder::new(store.clone()).build_context(user_id).await;
//!
//! let trending = TrendingSource::new(store.clone());
//! let candidates = trending.get_candidates(10).await?;
//! ```

// Public modules
pub mod category;
pub mod friends;
pub mod lookup;
pub mod profile;
pub mod serendipity;
pub mod similarity;
pub mod trending;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use category::CategorySource;
pub use friends::FriendSource;
pub use lookup::BookLookup;
pub use profile::{ProfileBuilder, extract_keywords};
pub use serendipity::SerendipitySource;
pub use similarity::SimilaritySource;
pub use trending::TrendingSource;
pub use types::{Candidate, HIGH_RATING, RecommendationReason, UserContext, UserProfile};
