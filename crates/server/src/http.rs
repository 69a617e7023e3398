//! HTTP surface of the discover service.
//!
//! - `GET /health`
//! - `GET /discover?limit=` (identity optional)
//! - `GET /discover/lists?limit=`
//! - `POST /discover/swipe` (identity required)

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use library::ReadingListSummary;

use crate::auth::{AuthConfig, Claims};
use crate::orchestrator::{
    DEFAULT_LISTS_LIMIT, Recommendations, RecommendationService, limit_param, parse_limit,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(service: RecommendationService, auth: AuthConfig) -> Self {
        Self {
            service: Arc::new(service),
            auth: Arc::new(auth),
        }
    }
}

/// HTTP-level errors
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The caller's identity, when a valid bearer token was presented.
///
/// A missing or invalid token is not an error: the request proceeds
/// anonymously.
pub struct MaybeUser(pub Option<Claims>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| state.auth.verify_header(value));
        Ok(MaybeUser(claims))
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Kept as text so that garbage falls back to the default
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListsResponse {
    pub lists: Vec<ReadingListSummary>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub success: bool,
    pub action: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/discover", get(discover))
        .route("/discover/lists", get(trending_lists))
        .route("/discover/swipe", post(swipe))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn discover(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Recommendations>> {
    let user_id = claims.as_ref().map(|claims| claims.user_id.as_str());

    let recommendations = state
        .service
        .get_recommendations(user_id, limit_param(query.limit.as_deref()))
        .await?;
    Ok(Json(recommendations))
}

async fn trending_lists(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<ListsResponse> {
    let limit = parse_limit(query.limit.as_deref(), DEFAULT_LISTS_LIMIT);
    let lists = state.service.trending_lists(limit).await;
    Json(ListsResponse {
        count: lists.len(),
        lists,
    })
}

async fn swipe(
    MaybeUser(claims): MaybeUser,
    Json(request): Json<SwipeRequest>,
) -> ApiResult<Json<SwipeResponse>> {
    let Some(claims) = claims else {
        return Err(ApiError::Unauthorized);
    };
    if request.book_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("book_id is required".to_string()));
    }
    if !matches!(request.action.as_str(), "like" | "pass") {
        return Err(ApiError::InvalidInput(format!(
            "action must be 'like' or 'pass', got {:?}",
            request.action
        )));
    }

    info!(
        "User {} swiped {} on book {}",
        claims.user_id, request.action, request.book_id
    );
    Ok(Json(SwipeResponse {
        success: true,
        action: request.action,
    }))
}
