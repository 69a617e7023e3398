//! Book resolution across the local store and the external catalog.
//!
//! Books the platform has never seen live only in the catalog. Whenever a
//! catalog result is used, it is written back to the store in the background
//! so later requests find it locally. Cache writes never block or fail the
//! request that triggered them.

use anyhow::Result;
use catalog::BookCatalog;
use library::{Book, ReadingStore};
use std::sync::Arc;
use tracing::debug;

/// Store-first book lookup with catalog fallback
#[derive(Clone)]
pub struct BookLookup {
    store: Arc<dyn ReadingStore>,
    catalog: Arc<dyn BookCatalog>,
}

impl BookLookup {
    pub fn new(store: Arc<dyn ReadingStore>, catalog: Arc<dyn BookCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn BookCatalog> {
        &self.catalog
    }

    /// Resolve a book by id: store first, then catalog.
    ///
    /// A book found only in the catalog is cached into the store.
    pub async fn book(&self, book_id: &str) -> Result<Option<Book>> {
        if let Some(book) = self.store.book(book_id).await? {
            return Ok(Some(book));
        }

        debug!("Book {} not in store, asking the catalog", book_id);
        let fetched = self.catalog.fetch(book_id).await?;
        if let Some(book) = &fetched {
            self.persist(vec![book.clone()]);
        }
        Ok(fetched)
    }

    /// Write catalog results to the store without waiting for completion
    pub fn persist(&self, books: Vec<Book>) {
        if books.is_empty() {
            return;
        }
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            for book in &books {
                if let Err(e) = store.cache_book(book).await {
                    debug!("Failed to cache book {}: {}", book.id, e);
                }
            }
        });
    }
}
