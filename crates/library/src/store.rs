//! The data-access capability the discover engine consumes.
//!
//! Every query the recommendation pipeline issues against the relational
//! store goes through [`ReadingStore`]. Two implementations live in this
//! crate: [`crate::MemoryLibrary`] (in-process maps) and
//! [`crate::PgLibrary`] (PostgreSQL via sqlx).

use crate::error::Result;
use crate::types::{
    Affinity, Book, BookId, FavoriteBook, FriendPick, ReadingListSummary,
};
use async_trait::async_trait;
use std::collections::HashSet;

/// Read-mostly access to users' reading history and the book table.
///
/// All methods are read-only except [`ReadingStore::cache_book`], which the
/// engine only ever calls fire-and-forget.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Ids of every book the user has a log for, whatever the status
    async fn logged_book_ids(&self, user_id: &str) -> Result<HashSet<BookId>>;

    /// Categories of books rated `>= min_rating`, ordered by
    /// (count desc, avg rating desc)
    async fn favorite_categories(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>>;

    /// Authors of books rated `>= min_rating`, same ordering as categories
    async fn favorite_authors(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>>;

    /// Logs rated `>= min_rating`, ordered by (rating desc, created_at desc)
    async fn favorite_books(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FavoriteBook>>;

    /// Up to `max_count` non-empty review texts written by the user
    async fn reviews(&self, user_id: &str, max_count: usize) -> Result<Vec<String>>;

    /// Books rated `>= min_rating` by users that `user_id` follows and that
    /// `user_id` has not logged, ordered by distinct friend count desc
    async fn friend_favorites(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FriendPick>>;

    /// Books with at least one "read" log, ordered by
    /// (log count desc, avg rating desc)
    async fn trending_books(&self, limit: usize) -> Result<Vec<Book>>;

    /// Any books, in random order
    async fn random_books(&self, limit: usize) -> Result<Vec<Book>>;

    /// Books with at least one "read" log and avg rating `>= min_rating`,
    /// in random order
    async fn random_quality_books(&self, min_rating: f64, limit: usize) -> Result<Vec<Book>>;

    /// A single book by id
    async fn book(&self, book_id: &str) -> Result<Option<Book>>;

    /// Upsert a catalog book into the local table
    async fn cache_book(&self, book: &Book) -> Result<()>;

    /// Public lists with at least one item, ordered by
    /// (items count desc, created_at desc)
    async fn trending_lists(&self, limit: usize) -> Result<Vec<ReadingListSummary>>;
}

