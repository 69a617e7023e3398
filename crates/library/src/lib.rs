//! # Library Crate
//!
//! Domain types and data access for the Folio reading platform.
//!
//! ## Main Components
//!
//! - **types**: Books, reading logs, follows, reading lists and aggregate rows
//! - **store**: The [`ReadingStore`] capability the discover engine consumes
//! - **index**: [`MemoryLibrary`], an in-process store loadable from JSON
//! - **postgres**: [`PgLibrary`], the production store over sqlx
//! - **error**: Error types for store access
//!
//! ## Example Usage
//!
//! ```ignore
//! use library::{MemoryLibrary, ReadingStore};
//! use std::path::Path;
//!
//! let library = MemoryLibrary::load_from_file(Path::new("data/library.json"))?;
//! let logged = library.logged_book_ids("a1b2...").await?;
//! let trending = library.trending_books(10).await?;
//! ```

// Public modules
pub mod error;
pub mod index;
pub mod postgres;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Result, StoreError};
pub use index::{BookStats, LibrarySnapshot, MemoryLibrary};
pub use postgres::PgLibrary;
pub use store::ReadingStore;
pub use types::{
    // Type aliases
    BookId,
    UserId,
    // Core types
    Book,
    Follow,
    LogStatus,
    ReadingList,
    ReadingLog,
    // Aggregate rows
    Affinity,
    FavoriteBook,
    FriendPick,
    ReadingListSummary,
};
