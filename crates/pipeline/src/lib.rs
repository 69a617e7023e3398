//! Pipeline for filtering and ranking book candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Aggregator, which turns the concatenated output of every source into
//!   the final ranked feed
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. Filters remove unwanted candidates (already logged, duplicates)
//! 2. Survivors are ranked by score with a stable sort and truncated
//! 3. The head of the feed is shuffled for presentation variety
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::Aggregator;
//!
//! let mut rng = StdRng::from_rng(&mut rand::rng());
//! let feed = Aggregator::new().dedupe_and_rank(candidates, &context.logged_books, 20, &mut rng)?;
//! ```

pub mod aggregator;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use aggregator::{Aggregator, PERTURBED_HEAD, perturb_head, rank_by_score};
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
