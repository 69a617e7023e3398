//! In-memory library: an indexed, in-process implementation of [`ReadingStore`].
//!
//! `MemoryLibrary` holds books, reading logs, the follow graph and reading
//! lists in plain maps. It answers every store query the discover engine
//! needs, computing aggregates (per-book read counts and average ratings)
//! on the fly with Rayon.
//!
//! It is loaded from a JSON snapshot for the CLI and built by hand in tests.

use crate::error::{Result, StoreError};
use crate::store::ReadingStore;
use crate::types::*;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Aggregate statistics for one book, derived from "read" logs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookStats {
    pub read_count: u32,
    /// Average over the rated "read" logs; `None` when none are rated
    pub avg_rating: Option<f64>,
}

/// On-disk shape of a library snapshot
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub logs: Vec<ReadingLog>,
    #[serde(default)]
    pub follows: Vec<Follow>,
    #[serde(default)]
    pub lists: Vec<ReadingList>,
}

/// In-process reading store.
///
/// Books sit behind a `RwLock` because [`ReadingStore::cache_book`] writes
/// through a shared reference; everything else is immutable once loaded.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    books: RwLock<HashMap<BookId, Book>>,
    logs: Vec<ReadingLog>,
    /// Indices into `logs`, per user, in insertion order
    user_logs: HashMap<UserId, Vec<usize>>,
    /// follower -> set of followed users
    following: HashMap<UserId, HashSet<UserId>>,
    lists: Vec<ReadingList>,
}

impl MemoryLibrary {
    /// Creates a new, empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a library from a JSON snapshot file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: LibrarySnapshot =
            serde_json::from_str(&raw).map_err(|e| StoreError::Snapshot {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let library = Self::from_snapshot(snapshot)?;
        let (books, logs, follows) = library.counts();
        info!(
            "Loaded library snapshot from {}: {} books, {} logs, {} follows",
            path.display(),
            books,
            logs,
            follows
        );
        Ok(library)
    }

    /// Build a library from an already-parsed snapshot, validating ratings
    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Result<Self> {
        let mut library = Self::new();
        for book in snapshot.books {
            library.insert_book(book);
        }
        for log in snapshot.logs {
            if let Some(rating) = log.rating
                && !(1..=5).contains(&rating)
            {
                return Err(StoreError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.to_string(),
                });
            }
            library.insert_log(log);
        }
        for follow in snapshot.follows {
            library.insert_follow(follow);
        }
        for list in snapshot.lists {
            library.insert_list(list);
        }
        Ok(library)
    }

    // Mutators - used while building the library

    pub fn insert_book(&mut self, book: Book) {
        self.books
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(book.id.clone(), book);
    }

    pub fn insert_log(&mut self, log: ReadingLog) {
        let index = self.logs.len();
        self.user_logs
            .entry(log.user_id.clone())
            .or_default()
            .push(index);
        self.logs.push(log);
    }

    pub fn insert_follow(&mut self, follow: Follow) {
        self.following
            .entry(follow.follower_id)
            .or_default()
            .insert(follow.following_id);
    }

    pub fn insert_list(&mut self, list: ReadingList) {
        self.lists.push(list);
    }

    /// (books, logs, follow edges), for logging and tests
    pub fn counts(&self) -> (usize, usize, usize) {
        let follows = self.following.values().map(HashSet::len).sum();
        (self.read_books().len(), self.logs.len(), follows)
    }

    fn read_books(&self) -> RwLockReadGuard<'_, HashMap<BookId, Book>> {
        self.books.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn logs_for<'a>(&'a self, user_id: &str) -> impl Iterator<Item = &'a ReadingLog> + 'a {
        self.user_logs
            .get(user_id)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&i| &self.logs[i])
    }

    /// Per-book statistics over "read" logs.
    ///
    /// Uses a parallel fold/reduce: each Rayon worker builds a partial map of
    /// (count, rating sum, rated count) and the partials are merged.
    pub fn book_stats(&self) -> HashMap<BookId, BookStats> {
        let partials = self
            .logs
            .par_iter()
            .filter(|log| log.status == LogStatus::Read)
            .fold(HashMap::new, |mut acc: HashMap<&str, (u32, u32, u32)>, log| {
                let entry = acc.entry(log.book_id.as_str()).or_insert((0, 0, 0));
                entry.0 += 1;
                if let Some(rating) = log.rating {
                    entry.1 += u32::from(rating);
                    entry.2 += 1;
                }
                acc
            })
            .reduce(HashMap::new, |mut acc, partial| {
                for (book_id, (count, sum, rated)) in partial {
                    let entry = acc.entry(book_id).or_insert((0, 0, 0));
                    entry.0 += count;
                    entry.1 += sum;
                    entry.2 += rated;
                }
                acc
            });

        partials
            .into_iter()
            .map(|(book_id, (read_count, sum, rated))| {
                let avg_rating = (rated > 0).then(|| f64::from(sum) / f64::from(rated));
                (
                    book_id.to_string(),
                    BookStats {
                        read_count,
                        avg_rating,
                    },
                )
            })
            .collect()
    }

    /// Group the user's highly rated books by a key extracted from each book
    fn affinities<F>(&self, user_id: &str, min_rating: u8, limit: usize, labels: F) -> Vec<Affinity>
    where
        F: Fn(&Book) -> &[String],
    {
        let books = self.read_books();
        let mut stats: HashMap<&str, (u32, u32)> = HashMap::new();

        for log in self.logs_for(user_id) {
            let Some(rating) = log.rating.filter(|r| *r >= min_rating) else {
                continue;
            };
            let Some(book) = books.get(&log.book_id) else {
                continue;
            };
            for label in labels(book) {
                let entry = stats.entry(label.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u32::from(rating);
            }
        }

        let mut affinities: Vec<Affinity> = stats
            .into_iter()
            .map(|(label, (count, sum))| Affinity {
                label: label.to_string(),
                count,
                avg_rating: f64::from(sum) / f64::from(count),
            })
            .collect();

        affinities.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.avg_rating.total_cmp(&a.avg_rating))
                .then_with(|| a.label.cmp(&b.label))
        });
        affinities.truncate(limit);
        affinities
    }

    fn with_stats(book: &Book, stats: &BookStats) -> Book {
        let mut book = book.clone();
        book.average_rating = Some(stats.avg_rating.unwrap_or(0.0));
        book.log_count = Some(stats.read_count);
        book
    }
}

/// Order `None` below every rating, like `NULLS LAST` on a descending sort
fn cmp_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl ReadingStore for MemoryLibrary {
    async fn logged_book_ids(&self, user_id: &str) -> Result<HashSet<BookId>> {
        Ok(self.logs_for(user_id).map(|log| log.book_id.clone()).collect())
    }

    async fn favorite_categories(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>> {
        Ok(self.affinities(user_id, min_rating, limit, |book| book.categories.as_slice()))
    }

    async fn favorite_authors(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>> {
        Ok(self.affinities(user_id, min_rating, limit, |book| book.authors.as_slice()))
    }

    async fn favorite_books(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FavoriteBook>> {
        let mut rated: Vec<&ReadingLog> = self
            .logs_for(user_id)
            .filter(|log| log.rating.is_some_and(|r| r >= min_rating))
            .collect();
        rated.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(rated
            .into_iter()
            .take(limit)
            .map(|log| FavoriteBook {
                book_id: log.book_id.clone(),
                rating: log.rating.unwrap_or_default(),
            })
            .collect())
    }

    async fn reviews(&self, user_id: &str, max_count: usize) -> Result<Vec<String>> {
        Ok(self
            .logs_for(user_id)
            .filter_map(|log| log.review.as_ref())
            .filter(|review| !review.trim().is_empty())
            .take(max_count)
            .cloned()
            .collect())
    }

    async fn friend_favorites(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FriendPick>> {
        let Some(followees) = self.following.get(user_id) else {
            return Ok(Vec::new());
        };
        let logged = self.logged_book_ids(user_id).await?;

        let mut fans: HashMap<&str, HashSet<&str>> = HashMap::new();
        for followee in followees {
            for log in self.logs_for(followee) {
                if log.rating.is_some_and(|r| r >= min_rating) && !logged.contains(&log.book_id) {
                    fans.entry(log.book_id.as_str())
                        .or_default()
                        .insert(log.user_id.as_str());
                }
            }
        }

        let mut picks: Vec<FriendPick> = fans
            .into_iter()
            .map(|(book_id, friends)| FriendPick {
                book_id: book_id.to_string(),
                friend_count: friends.len() as u32,
            })
            .collect();
        picks.sort_by(|a, b| {
            b.friend_count
                .cmp(&a.friend_count)
                .then_with(|| a.book_id.cmp(&b.book_id))
        });
        picks.truncate(limit);
        debug!("Found {} friend picks for user {}", picks.len(), user_id);
        Ok(picks)
    }

    async fn trending_books(&self, limit: usize) -> Result<Vec<Book>> {
        let stats = self.book_stats();
        let books = self.read_books();

        let mut ranked: Vec<(&Book, &BookStats)> = stats
            .iter()
            .filter(|(_, s)| s.read_count > 0)
            .filter_map(|(id, s)| books.get(id).map(|book| (book, s)))
            .collect();
        ranked.sort_by(|(a, sa), (b, sb)| {
            sb.read_count
                .cmp(&sa.read_count)
                .then_with(|| cmp_rating_desc(sa.avg_rating, sb.avg_rating))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(book, s)| Self::with_stats(book, s))
            .collect())
    }

    async fn random_books(&self, limit: usize) -> Result<Vec<Book>> {
        let mut all: Vec<Book> = self.read_books().values().cloned().collect();
        all.shuffle(&mut rand::rng());
        all.truncate(limit);
        Ok(all)
    }

    async fn random_quality_books(&self, min_rating: f64, limit: usize) -> Result<Vec<Book>> {
        let stats = self.book_stats();
        let books = self.read_books();

        let mut quality: Vec<Book> = stats
            .iter()
            .filter(|(_, s)| s.read_count > 0 && s.avg_rating.is_some_and(|avg| avg >= min_rating))
            .filter_map(|(id, s)| books.get(id).map(|book| Self::with_stats(book, s)))
            .collect();
        quality.shuffle(&mut rand::rng());
        quality.truncate(limit);
        Ok(quality)
    }

    async fn book(&self, book_id: &str) -> Result<Option<Book>> {
        Ok(self.read_books().get(book_id).cloned())
    }

    async fn cache_book(&self, book: &Book) -> Result<()> {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        books.entry(book.id.clone()).or_insert_with(|| book.clone());
        Ok(())
    }

    async fn trending_lists(&self, limit: usize) -> Result<Vec<ReadingListSummary>> {
        let mut lists: Vec<&ReadingList> = self
            .lists
            .iter()
            .filter(|list| list.is_public && list.items_count > 0)
            .collect();
        lists.sort_by(|a, b| {
            b.items_count
                .cmp(&a.items_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(lists
            .into_iter()
            .take(limit)
            .map(ReadingListSummary::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn log(user: &str, book: &str, status: LogStatus, rating: Option<u8>, minute: i64) -> ReadingLog {
        ReadingLog {
            user_id: user.to_string(),
            book_id: book.to_string(),
            status,
            rating,
            review: None,
            created_at: at(minute),
        }
    }

    fn create_test_library() -> MemoryLibrary {
        let mut library = MemoryLibrary::new();

        library.insert_book(
            Book::new("b1", "Dune")
                .with_authors(["Frank Herbert"])
                .with_categories(["Science Fiction", "Classics"]),
        );
        library.insert_book(
            Book::new("b2", "Hyperion")
                .with_authors(["Dan Simmons"])
                .with_categories(["Science Fiction"]),
        );
        library.insert_book(
            Book::new("b3", "Emma")
                .with_authors(["Jane Austen"])
                .with_categories(["Classics"]),
        );
        library.insert_book(Book::new("b4", "Untitled"));

        // alice loves sci-fi
        library.insert_log(log("alice", "b1", LogStatus::Read, Some(5), 1));
        library.insert_log(log("alice", "b2", LogStatus::Read, Some(4), 2));
        library.insert_log(log("alice", "b3", LogStatus::Read, Some(2), 3));

        // bob and carol are alice's friends
        library.insert_log(log("bob", "b3", LogStatus::Read, Some(5), 4));
        library.insert_log(log("bob", "b4", LogStatus::Read, Some(4), 5));
        library.insert_log(log("carol", "b4", LogStatus::Read, Some(5), 6));
        library.insert_log(log("carol", "b1", LogStatus::Reading, None, 7));

        library.insert_follow(Follow {
            follower_id: "alice".to_string(),
            following_id: "bob".to_string(),
        });
        library.insert_follow(Follow {
            follower_id: "alice".to_string(),
            following_id: "carol".to_string(),
        });

        library
    }

    #[tokio::test]
    async fn test_logged_book_ids() {
        let library = create_test_library();
        let logged = library.logged_book_ids("alice").await.unwrap();
        assert_eq!(logged.len(), 3);
        assert!(logged.contains("b1"));
        assert!(library.logged_book_ids("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorite_categories_ordering() {
        let library = create_test_library();
        let categories = library.favorite_categories("alice", 4, 10).await.unwrap();

        // Science Fiction: b1 (5) + b2 (4) -> count 2; Classics: b1 only (b3 rated 2)
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].label, "Science Fiction");
        assert_eq!(categories[0].count, 2);
        assert!((categories[0].avg_rating - 4.5).abs() < 1e-9);
        assert_eq!(categories[1].label, "Classics");
    }

    #[tokio::test]
    async fn test_favorite_books_rating_then_recency() {
        let mut library = create_test_library();
        library.insert_log(log("alice", "b4", LogStatus::Read, Some(5), 10));

        let favorites = library.favorite_books("alice", 4, 5).await.unwrap();
        let ids: Vec<&str> = favorites.iter().map(|f| f.book_id.as_str()).collect();
        // b4 and b1 are both 5 stars; b4 is more recent
        assert_eq!(ids, vec!["b4", "b1", "b2"]);
    }

    #[tokio::test]
    async fn test_friend_favorites_excludes_logged_and_counts_friends() {
        let library = create_test_library();
        let picks = library.friend_favorites("alice", 4, 10).await.unwrap();

        // b3 is liked by bob but alice logged it; b4 is liked by bob and carol
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].book_id, "b4");
        assert_eq!(picks[0].friend_count, 2);
    }

    #[tokio::test]
    async fn test_friend_favorites_without_followees() {
        let library = create_test_library();
        assert!(library.friend_favorites("bob", 4, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trending_books_ordering() {
        let library = create_test_library();
        let trending = library.trending_books(10).await.unwrap();
        let ids: Vec<&str> = trending.iter().map(|b| b.id.as_str()).collect();

        // b3: 2 reads avg 3.5, b4: 2 reads avg 4.5, b1: 1 read (carol is still reading), b2: 1 read
        assert_eq!(ids, vec!["b4", "b3", "b1", "b2"]);
        assert_eq!(trending[0].log_count, Some(2));
        assert_eq!(trending[0].average_rating, Some(4.5));
    }

    #[tokio::test]
    async fn test_random_quality_books_threshold() {
        let library = create_test_library();
        let books = library.random_quality_books(4.0, 10).await.unwrap();
        let ids: HashSet<&str> = books.iter().map(|b| b.id.as_str()).collect();

        assert!(ids.contains("b1"));
        assert!(ids.contains("b2"));
        assert!(ids.contains("b4"));
        assert!(!ids.contains("b3"));
    }

    #[tokio::test]
    async fn test_cache_book_keeps_existing_row() {
        let library = create_test_library();
        library.cache_book(&Book::new("b1", "Other title")).await.unwrap();
        library.cache_book(&Book::new("new", "Fresh")).await.unwrap();

        assert_eq!(library.book("b1").await.unwrap().unwrap().title, "Dune");
        assert_eq!(library.book("new").await.unwrap().unwrap().title, "Fresh");
    }

    #[tokio::test]
    async fn test_reviews_skip_blank() {
        let mut library = MemoryLibrary::new();
        let mut first = log("dave", "b1", LogStatus::Read, Some(4), 1);
        first.review = Some("   ".to_string());
        let mut second = log("dave", "b2", LogStatus::Read, Some(4), 2);
        second.review = Some("Loved the worldbuilding".to_string());
        library.insert_log(first);
        library.insert_log(second);

        let reviews = library.reviews("dave", 20).await.unwrap();
        assert_eq!(reviews, vec!["Loved the worldbuilding".to_string()]);
    }

    #[tokio::test]
    async fn test_trending_lists() {
        let mut library = MemoryLibrary::new();
        for (id, public, items) in [("l1", true, 3), ("l2", true, 0), ("l3", false, 9), ("l4", true, 7)] {
            library.insert_list(ReadingList {
                id: id.to_string(),
                user_id: "alice".to_string(),
                username: "alice".to_string(),
                name: format!("List {}", id),
                description: None,
                is_public: public,
                items_count: items,
                created_at: at(0),
            });
        }

        let lists = library.trending_lists(10).await.unwrap();
        let ids: Vec<&str> = lists.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l4", "l1"]);
    }

    #[test]
    fn test_snapshot_rejects_out_of_range_rating() {
        let snapshot = LibrarySnapshot {
            logs: vec![log("alice", "b1", LogStatus::Read, Some(9), 1)],
            ..LibrarySnapshot::default()
        };
        assert!(MemoryLibrary::from_snapshot(snapshot).is_err());
    }
}
