//! Filter to remove books the user already has on their shelves.
//!
//! Any log status counts, including want-to-read and dnf.

use crate::traits::Filter;
use anyhow::Result;
use library::BookId;
use sources::Candidate;
use std::collections::HashSet;

/// Removes candidates the user has already logged.
pub struct AlreadyLoggedFilter;

impl Filter for AlreadyLoggedFilter {
    fn name(&self) -> &str {
        "AlreadyLoggedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        logged_books: &HashSet<BookId>,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !logged_books.contains(candidate.book_id()))
            .collect();
        Ok(filtered)
    }
}
