//! PostgreSQL-backed [`ReadingStore`].
//!
//! Queries run against the existing Folio schema (`books`, `logs`,
//! `followers`, `lists`, `users`). Every statement is parameterized; user
//! ids are UUID columns, book ids are text.

use crate::error::Result;
use crate::store::ReadingStore;
use crate::types::{
    Affinity, Book, BookId, FavoriteBook, FriendPick, ReadingListSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use tracing::info;

const BOOK_COLUMNS: &str = "b.id, b.title, b.authors, b.description, b.cover_url, \
                            b.published_date, b.page_count, b.categories";

/// Reading store over a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgLibrary {
    pool: PgPool,
}

impl PgLibrary {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Database connection pool established ({} max connections)", max_connections);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    title: String,
    authors: Option<Vec<String>>,
    description: Option<String>,
    cover_url: Option<String>,
    published_date: Option<String>,
    page_count: Option<i32>,
    categories: Option<Vec<String>>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            authors: row.authors.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            cover_url: row.cover_url.unwrap_or_default(),
            categories: row.categories.unwrap_or_default(),
            published_date: row.published_date.unwrap_or_default(),
            page_count: row.page_count.unwrap_or_default().max(0) as u32,
            average_rating: None,
            log_count: None,
        }
    }
}

#[derive(FromRow)]
struct RatedBookRow {
    #[sqlx(flatten)]
    book: BookRow,
    log_count: i64,
    avg_rating: Option<f64>,
}

impl From<RatedBookRow> for Book {
    fn from(row: RatedBookRow) -> Self {
        let mut book = Book::from(row.book);
        book.log_count = Some(row.log_count.max(0) as u32);
        book.average_rating = Some(row.avg_rating.unwrap_or(0.0));
        book
    }
}

#[derive(FromRow)]
struct AffinityRow {
    label: String,
    count: i64,
    avg_rating: Option<f64>,
}

impl From<AffinityRow> for Affinity {
    fn from(row: AffinityRow) -> Self {
        Affinity {
            label: row.label,
            count: row.count.max(0) as u32,
            avg_rating: row.avg_rating.unwrap_or(0.0),
        }
    }
}

#[derive(FromRow)]
struct ListRow {
    id: String,
    name: String,
    description: Option<String>,
    items_count: i32,
    created_at: DateTime<Utc>,
    owner_id: String,
    owner_username: String,
}

fn as_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl ReadingStore for PgLibrary {
    async fn logged_book_ids(&self, user_id: &str) -> Result<HashSet<BookId>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT book_id FROM logs WHERE user_id = $1::uuid")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn favorite_categories(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>> {
        let rows: Vec<AffinityRow> = sqlx::query_as(
            r#"
            SELECT unnest(b.categories) AS label, COUNT(*) AS count, AVG(l.rating)::float8 AS avg_rating
            FROM logs l
            JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1::uuid AND l.rating >= $2 AND b.categories IS NOT NULL
            GROUP BY label
            ORDER BY count DESC, avg_rating DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i32::from(min_rating))
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Affinity::from).collect())
    }

    async fn favorite_authors(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<Affinity>> {
        let rows: Vec<AffinityRow> = sqlx::query_as(
            r#"
            SELECT unnest(b.authors) AS label, COUNT(*) AS count, AVG(l.rating)::float8 AS avg_rating
            FROM logs l
            JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1::uuid AND l.rating >= $2 AND b.authors IS NOT NULL
            GROUP BY label
            ORDER BY count DESC, avg_rating DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i32::from(min_rating))
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Affinity::from).collect())
    }

    async fn favorite_books(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FavoriteBook>> {
        let rows: Vec<(String, i32)> = sqlx::query_as(
            r#"
            SELECT l.book_id, l.rating
            FROM logs l
            WHERE l.user_id = $1::uuid AND l.rating >= $2
            ORDER BY l.rating DESC, l.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i32::from(min_rating))
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(book_id, rating)| FavoriteBook {
                book_id,
                rating: rating.clamp(0, 5) as u8,
            })
            .collect())
    }

    async fn reviews(&self, user_id: &str, max_count: usize) -> Result<Vec<String>> {
        let reviews: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT l.review
            FROM logs l
            WHERE l.user_id = $1::uuid AND l.review IS NOT NULL AND l.review != ''
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(as_limit(max_count))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn friend_favorites(
        &self,
        user_id: &str,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<FriendPick>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT l.book_id, COUNT(DISTINCT l.user_id) AS friend_count
            FROM logs l
            JOIN followers f ON l.user_id = f.following_id
            WHERE f.follower_id = $1::uuid
              AND l.rating >= $2
              AND l.book_id NOT IN (SELECT book_id FROM logs WHERE user_id = $1::uuid)
            GROUP BY l.book_id
            ORDER BY friend_count DESC, l.book_id
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i32::from(min_rating))
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(book_id, count)| FriendPick {
                book_id,
                friend_count: count.max(0) as u32,
            })
            .collect())
    }

    async fn trending_books(&self, limit: usize) -> Result<Vec<Book>> {
        let query = format!(
            r#"
            SELECT {BOOK_COLUMNS},
                   COUNT(l.id) AS log_count,
                   AVG(l.rating)::float8 AS avg_rating
            FROM books b
            JOIN logs l ON b.id = l.book_id AND l.status = 'read'
            GROUP BY b.id
            ORDER BY log_count DESC, avg_rating DESC NULLS LAST
            LIMIT $1
            "#
        );
        let rows: Vec<RatedBookRow> = sqlx::query_as(&query)
            .bind(as_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn random_books(&self, limit: usize) -> Result<Vec<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books b ORDER BY RANDOM() LIMIT $1");
        let rows: Vec<BookRow> = sqlx::query_as(&query)
            .bind(as_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn random_quality_books(&self, min_rating: f64, limit: usize) -> Result<Vec<Book>> {
        let query = format!(
            r#"
            SELECT {BOOK_COLUMNS},
                   COUNT(l.id) AS log_count,
                   AVG(l.rating)::float8 AS avg_rating
            FROM books b
            JOIN logs l ON b.id = l.book_id AND l.status = 'read'
            GROUP BY b.id
            HAVING COUNT(l.id) > 0 AND AVG(l.rating) >= $1
            ORDER BY RANDOM()
            LIMIT $2
            "#
        );
        let rows: Vec<RatedBookRow> = sqlx::query_as(&query)
            .bind(min_rating)
            .bind(as_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn book(&self, book_id: &str) -> Result<Option<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = $1");
        let row: Option<BookRow> = sqlx::query_as(&query)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn cache_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, authors, description, cover_url, published_date,
                               page_count, categories, api_source, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'google', NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET updated_at = NOW()
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.authors)
        .bind(&book.description)
        .bind(&book.cover_url)
        .bind(&book.published_date)
        .bind(i32::try_from(book.page_count).unwrap_or(i32::MAX))
        .bind(&book.categories)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn trending_lists(&self, limit: usize) -> Result<Vec<ReadingListSummary>> {
        let rows: Vec<ListRow> = sqlx::query_as(
            r#"
            SELECT l.id::text AS id, l.name, l.description, l.items_count, l.created_at,
                   u.id::text AS owner_id, u.username AS owner_username
            FROM lists l
            JOIN users u ON l.user_id = u.id
            WHERE l.is_public = true AND l.items_count > 0
            ORDER BY l.items_count DESC, l.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReadingListSummary {
                id: row.id,
                name: row.name,
                description: row.description,
                items_count: row.items_count.max(0) as u32,
                created_at: row.created_at,
                owner_id: row.owner_id,
                owner_username: row.owner_username,
            })
            .collect())
    }
}
