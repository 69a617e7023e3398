//! The `Filter` seam of the aggregation stage.

use anyhow::Result;
use library::BookId;
use sources::Candidate;
use std::collections::HashSet;

/// A pass over the merged candidate list that may drop entries.
///
/// Implementations must keep survivors in their input order; duplicate
/// resolution and score ties both depend on it.
pub trait Filter: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Drop unwanted candidates. `logged_books` is every book the requesting
    /// reader has any log entry for.
    fn apply(
        &self,
        candidates: Vec<Candidate>,
        logged_books: &HashSet<BookId>,
    ) -> Result<Vec<Candidate>>;
}
