//! Filter to collapse candidates that point at the same book.
//!
//! The first occurrence wins, whatever its score. Sources are concatenated
//! in a fixed order (Similarity, Friend, Category, Trending, Serendipity),
//! so the earliest source's reason is the one the user sees.

use crate::traits::Filter;
use anyhow::Result;
use library::BookId;
use sources::Candidate;
use std::collections::HashSet;

/// Keeps the first candidate for each book id.
pub struct DuplicateFilter;

impl Filter for DuplicateFilter {
    fn name(&self) -> &str {
        "DuplicateFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _logged_books: &HashSet<BookId>,
    ) -> Result<Vec<Candidate>> {
        let mut seen: HashSet<BookId> = HashSet::with_capacity(candidates.len());
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.book.id.clone()))
            .collect();
        Ok(filtered)
    }
}
