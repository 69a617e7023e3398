//! Discover service binary.
//!
//! Reads configuration from the environment (and `.env`), opens the reading
//! store, and serves the discover endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use server::{AppState, AuthConfig, Config, RecommendationService, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    server::init_tracing();

    info!("Starting Folio discover service");
    let config = Config::from_env()?;

    let store = config.open_store().await?;
    let catalog = Arc::new(config.catalog());
    let service =
        RecommendationService::new(store, catalog).with_timeout(config.recommendation_timeout());
    let auth = AuthConfig::new(config.jwt_secret());

    let app = create_router(AppState::new(service, auth));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
