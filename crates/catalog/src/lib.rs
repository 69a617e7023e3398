//! External book catalog client.
//!
//! This crate provides the [`BookCatalog`] capability (free-text search and
//! lookup by id) and a Google Books implementation of it. It handles:
//! - Building volume search and volume lookup requests
//! - Normalizing volume JSON into the shared [`library::Book`] shape
//! - Mapping transport and status failures into [`CatalogError`]

use async_trait::async_trait;
use library::Book;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

/// Google Books caps `maxResults` at 40
pub const MAX_RESULTS_PER_QUERY: usize = 40;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";

/// Errors that can occur when talking to the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from catalog: {0}")]
    InvalidResponse(String),

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;

/// A third-party book metadata service.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Free-text search (supports `subject:` and `inauthor:` qualifiers)
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Book>>;

    /// Look up one volume; `Ok(None)` when the catalog doesn't know it
    async fn fetch(&self, book_id: &str) -> Result<Option<Book>>;
}

// =============================================================================
// Google Books wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct VolumeList {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: String,
    authors: Vec<String>,
    description: String,
    categories: Vec<String>,
    page_count: u32,
    published_date: String,
    image_links: ImageLinks,
    average_rating: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageLinks {
    thumbnail: String,
    small_thumbnail: String,
}

impl From<Volume> for Book {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        let cover = if info.image_links.thumbnail.is_empty() {
            info.image_links.small_thumbnail
        } else {
            info.image_links.thumbnail
        };

        Book {
            id: volume.id,
            title: info.title,
            authors: info.authors,
            description: info.description,
            cover_url: upgrade_cover(&cover),
            categories: info.categories,
            published_date: info.published_date,
            page_count: info.page_count,
            average_rating: info.average_rating,
            log_count: None,
        }
    }
}

/// Ask for the larger rendition of a Google Books thumbnail
fn upgrade_cover(url: &str) -> String {
    url.replacen("zoom=1", "zoom=2", 1)
}

// =============================================================================
// Client
// =============================================================================

/// Google Books API client
#[derive(Clone)]
pub struct GoogleBooksClient {
    http_client: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleBooksClient {
    /// Create a client; the API key is optional (unauthenticated quota applies)
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.filter(|key| !key.is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (default: Google Books v1)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reuse an existing reqwest client (connection pool, timeouts)
    pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` followed by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!("Catalog returned status {}: {}", status, body);
        Err(CatalogError::Status { status, body })
    }
}

#[async_trait]
impl BookCatalog for GoogleBooksClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Book>> {
        let max_results = max_results.clamp(1, MAX_RESULTS_PER_QUERY);
        debug!("Searching catalog for {:?} (max {})", query, max_results);
        let max_results = max_results.to_string();

        let request = self
            .http_client
            .get(self.endpoint(&["volumes"])?)
            .query(&[
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("orderBy", "relevance"),
            ]);
        let response = Self::error_for_status(self.with_key(request).send().await?).await?;

        let list: VolumeList = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        let books: Vec<Book> = list.items.into_iter().map(Book::from).collect();
        debug!("Catalog returned {} books for {:?}", books.len(), query);
        Ok(books)
    }

    async fn fetch(&self, book_id: &str) -> Result<Option<Book>> {
        let request = self.http_client.get(self.endpoint(&["volumes", book_id])?);
        let response = self.with_key(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::error_for_status(response).await?;

        let volume: Volume = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        Ok(Some(Book::from(volume)))
    }
}
