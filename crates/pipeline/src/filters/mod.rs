//! Filter implementations for the candidate pipeline.

pub mod already_logged;
pub mod duplicate;

// Re-export for convenience
pub use already_logged::AlreadyLoggedFilter;
pub use duplicate::DuplicateFilter;
