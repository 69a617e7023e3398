//! Server crate for the Folio discover engine.
//!
//! This crate contains the service that coordinates all components of the
//! recommendation pipeline, its configuration, and the HTTP surface.

pub mod auth;
pub mod config;
pub mod http;
pub mod orchestrator;

pub use auth::{AuthConfig, Claims};
pub use config::Config;
pub use http::{AppState, create_router};
pub use orchestrator::{
    DEFAULT_LIMIT, DEFAULT_LISTS_LIMIT, MAX_LIMIT, Recommendations, RecommendationService,
    SourceQuotas, limit_param, parse_limit, resolve_limit,
};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,server=debug,sources=debug,pipeline=debug";

/// Initialize tracing from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}
