//! Core domain types for the reading library.
//!
//! Everything the discover engine reads from the store is expressed here:
//! books, reading logs, the follow graph and public reading lists, plus the
//! small aggregate rows the profile queries return.
//!
//! Books can come from two places (a local `books` row or an external catalog
//! result). Both normalize to the same [`Book`] shape before scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque user identifier (a UUID string in the relational store)
pub type UserId = String;

/// Opaque book identifier (a local id or a catalog volume id)
pub type BookId = String;

// =============================================================================
// Book
// =============================================================================

/// A book, normalized across local rows and catalog results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: String,
    /// Ordered; the first entry is treated as the primary category
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub page_count: u32,
    /// Platform (or catalog) average rating, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    /// Number of "read" logs on the platform, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_count: Option<u32>,
}

impl Book {
    /// Create a book with just an id and a title.
    pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// First category, if any
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// First author, if any
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }
}

// =============================================================================
// Reading logs and the social graph
// =============================================================================

/// Shelf status of a reading log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    WantToRead,
    Reading,
    Read,
    Dnf,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::WantToRead => "want_to_read",
            LogStatus::Reading => "reading",
            LogStatus::Read => "read",
            LogStatus::Dnf => "dnf",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading log entry: one user, one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingLog {
    pub user_id: UserId,
    pub book_id: BookId,
    pub status: LogStatus,
    /// Rating from 1 to 5
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A follow edge: `follower_id` follows `following_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: UserId,
    pub following_id: UserId,
}

/// A user-curated reading list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingList {
    pub id: String,
    pub user_id: UserId,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_public: bool,
    pub items_count: u32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Aggregate rows
// =============================================================================

/// A category or author the user rates highly, with its aggregate stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
    pub label: String,
    pub count: u32,
    pub avg_rating: f64,
}

/// One of the user's best-rated books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteBook {
    pub book_id: BookId,
    pub rating: u8,
}

/// A book highly rated by people the user follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendPick {
    pub book_id: BookId,
    /// Number of distinct followees who rated it highly
    pub friend_count: u32,
}

/// Summary row for the trending public lists view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingListSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub items_count: u32,
    pub created_at: DateTime<Utc>,
    pub owner_id: UserId,
    pub owner_username: String,
}

impl From<&ReadingList> for ReadingListSummary {
    fn from(list: &ReadingList) -> Self {
        Self {
            id: list.id.clone(),
            name: list.name.clone(),
            description: list.description.clone(),
            items_count: list.items_count,
            created_at: list.created_at,
            owner_id: list.user_id.clone(),
            owner_username: list.username.clone(),
        }
    }
}
