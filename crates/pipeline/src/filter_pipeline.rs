//! Ordered chain of candidate filters.

use crate::traits::Filter;
use anyhow::Result;
use library::BookId;
use sources::Candidate;
use std::collections::HashSet;
use tracing::debug;

/// Runs its filters front to back, each one seeing the previous output.
///
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyLoggedFilter)
///     .add_filter(DuplicateFilter);
/// let kept = pipeline.apply(candidates, &context.logged_books)?;
/// ```
pub struct FilterPipeline {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a filter after the existing ones
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.stages.push(Box::new(filter));
        self
    }

    /// Names of the filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage; the first failing stage aborts the chain
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        logged_books: &HashSet<BookId>,
    ) -> Result<Vec<Candidate>> {
        self.stages
            .iter()
            .try_fold(candidates, |remaining, stage| {
                let before = remaining.len();
                let kept = stage.apply(remaining, logged_books)?;
                debug!("{} kept {} of {} candidates", stage.name(), kept.len(), before);
                Ok(kept)
            })
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{AlreadyLoggedFilter, DuplicateFilter};
    use library::Book;
    use sources::RecommendationReason;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(Book::new("b1", "Dune"), RecommendationReason::Trending),
            Candidate::new(Book::new("b2", "Emma"), RecommendationReason::Serendipity),
            Candidate::new(Book::new("b1", "Dune"), RecommendationReason::Serendipity),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let filtered = pipeline.apply(candidates(), &HashSet::new()).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filters_compose() {
        let logged: HashSet<BookId> = ["b2".to_string()].into_iter().collect();
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyLoggedFilter)
            .add_filter(DuplicateFilter);

        assert_eq!(pipeline.filter_names(), vec!["AlreadyLoggedFilter", "DuplicateFilter"]);

        let filtered = pipeline.apply(candidates(), &logged).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].book_id(), "b1");
        assert_eq!(filtered[0].reason, RecommendationReason::Trending);
    }
}
