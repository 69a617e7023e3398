use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use catalog::GoogleBooksClient;
use library::{MemoryLibrary, PgLibrary, ReadingStore};
use serde::Deserialize;
use tracing::{info, warn};

/// Secret used when `JWT_SECRET` is not set; only fit for local development
const DEV_JWT_SECRET: &str = "folio-dev-secret-change-me";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; when absent the in-memory store is used
    pub database_url: Option<String>,

    /// JSON library snapshot for the in-memory store
    pub data_file: Option<PathBuf>,

    /// Google Books API key (optional, raises the request quota)
    pub google_books_api_key: Option<String>,

    /// Google Books API base URL
    #[serde(default = "default_google_books_api_url")]
    pub google_books_api_url: String,

    /// HS256 secret for verifying bearer tokens
    pub jwt_secret: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline for one discover request, in seconds
    #[serde(default = "default_recommendation_timeout_secs")]
    pub recommendation_timeout_secs: u64,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
}

fn default_google_books_api_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_recommendation_timeout_secs() -> u64 {
    10
}

fn default_database_max_connections() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            data_file: None,
            google_books_api_key: None,
            google_books_api_url: default_google_books_api_url(),
            jwt_secret: None,
            host: default_host(),
            port: default_port(),
            recommendation_timeout_secs: default_recommendation_timeout_secs(),
            database_max_connections: default_database_max_connections(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn recommendation_timeout(&self) -> Duration {
        Duration::from_secs(self.recommendation_timeout_secs)
    }

    /// The configured JWT secret, or the development default
    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET
            }
        }
    }

    /// Open the reading store this configuration points at.
    ///
    /// Postgres wins when `database_url` is set; otherwise the JSON snapshot
    /// in `data_file` is loaded, or an empty library when neither is given.
    pub async fn open_store(&self) -> anyhow::Result<Arc<dyn ReadingStore>> {
        if let Some(url) = &self.database_url {
            let library = PgLibrary::connect(url, self.database_max_connections)
                .await
                .context("Failed to connect to the database")?;
            return Ok(Arc::new(library));
        }

        if let Some(path) = &self.data_file {
            let library = MemoryLibrary::load_from_file(path)
                .with_context(|| format!("Failed to load library from {}", path.display()))?;
            return Ok(Arc::new(library));
        }

        warn!("Neither DATABASE_URL nor DATA_FILE set, starting with an empty library");
        Ok(Arc::new(MemoryLibrary::new()))
    }

    pub fn catalog(&self) -> GoogleBooksClient {
        info!("Using book catalog at {}", self.google_books_api_url);
        GoogleBooksClient::new(self.google_books_api_key.clone())
            .with_base_url(self.google_books_api_url.clone())
    }
}
