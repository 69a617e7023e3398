//! Shared fixtures for the source tests.

use async_trait::async_trait;
use catalog::BookCatalog;
use chrono::{Duration, TimeZone, Utc};
use library::{
    Affinity, Book, BookId, FavoriteBook, Follow, FriendPick, LogStatus, MemoryLibrary,
    ReadingListSummary, ReadingLog, ReadingStore,
};
use std::collections::HashSet;

mockall::mock! {
    pub Catalog {}

    #[async_trait]
    impl BookCatalog for Catalog {
        async fn search(&self, query: &str, max_results: usize) -> catalog::Result<Vec<Book>>;
        async fn fetch(&self, book_id: &str) -> catalog::Result<Option<Book>>;
    }
}

mockall::mock! {
    pub Store {}

    #[async_trait]
    impl ReadingStore for Store {
        async fn logged_book_ids(&self, user_id: &str) -> library::Result<HashSet<BookId>>;
        async fn favorite_categories(&self, user_id: &str, min_rating: u8, limit: usize) -> library::Result<Vec<Affinity>>;
        async fn favorite_authors(&self, user_id: &str, min_rating: u8, limit: usize) -> library::Result<Vec<Affinity>>;
        async fn favorite_books(&self, user_id: &str, min_rating: u8, limit: usize) -> library::Result<Vec<FavoriteBook>>;
        async fn reviews(&self, user_id: &str, max_count: usize) -> library::Result<Vec<String>>;
        async fn friend_favorites(&self, user_id: &str, min_rating: u8, limit: usize) -> library::Result<Vec<FriendPick>>;
        async fn trending_books(&self, limit: usize) -> library::Result<Vec<Book>>;
        async fn random_books(&self, limit: usize) -> library::Result<Vec<Book>>;
        async fn random_quality_books(&self, min_rating: f64, limit: usize) -> library::Result<Vec<Book>>;
        async fn book(&self, book_id: &str) -> library::Result<Option<Book>>;
        async fn cache_book(&self, book: &Book) -> library::Result<()>;
        async fn trending_lists(&self, limit: usize) -> library::Result<Vec<ReadingListSummary>>;
    }
}

/// A store error to hand back from mocks
pub fn store_failure() -> library::StoreError {
    library::StoreError::InvalidValue {
        field: "connection".to_string(),
        value: "closed".to_string(),
    }
}

/// A catalog error to hand back from mocks
pub fn catalog_failure() -> catalog::CatalogError {
    catalog::CatalogError::Status {
        status: 503,
        body: "backend unavailable".to_string(),
    }
}

pub fn log(user: &str, book: &str, rating: Option<u8>, minute: i64) -> ReadingLog {
    ReadingLog {
        user_id: user.to_string(),
        book_id: book.to_string(),
        status: LogStatus::Read,
        rating,
        review: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
    }
}

/// `reader` loves Dune and Hyperion, follows `bob` and `carol`.
///
/// Trending by read count: b4 (2 reads, 5.0), b5 (2 reads, 4.5), then b1, b2, b3.
pub fn sample_library() -> MemoryLibrary {
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
    library.insert_book(
        Book::new("b4", "Piranesi")
            .with_authors(["Susanna Clarke"])
            .with_categories(["Fantasy"]),
    );
    library.insert_book(
        Book::new("b5", "Circe")
            .with_authors(["Madeline Miller"])
            .with_categories(["Fantasy"]),
    );

    let mut review = log("reader", "b1", Some(5), 1);
    review.review = Some("The desert politics and the spice economy were stunning".to_string());
    library.insert_log(review);
    library.insert_log(log("reader", "b2", Some(4), 2));
    library.insert_log(log("reader", "b3", Some(2), 3));

    library.insert_log(log("bob", "b4", Some(5), 4));
    library.insert_log(log("bob", "b5", Some(4), 5));
    library.insert_log(log("carol", "b4", Some(5), 6));
    library.insert_log(log("dave", "b5", Some(5), 7));

    for friend in ["bob", "carol"] {
        library.insert_follow(Follow {
            follower_id: "reader".to_string(),
            following_id: friend.to_string(),
        });
    }

    library
}

/// A catalog search result with a category
pub fn catalog_book(id: &str, category: &str) -> Book {
    Book::new(id, format!("Catalog {}", id)).with_categories([category])
}
