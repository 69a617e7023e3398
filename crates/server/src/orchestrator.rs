//! # Recommendation Service
//!
//! This module coordinates the entire discover pipeline:
//! 1. Build the user context (profile + logged books)
//! 2. Split the requested size into per-source quotas
//! 3. Run all five candidate sources concurrently
//! 4. Deduplicate, filter, rank and truncate (Aggregator)
//! 5. Shuffle the head of the feed
//!
//! Anonymous requests skip steps 1-4 and get the trending feed.
//!
//! Every stage is bounded by one request deadline. A source that fails or
//! runs past the deadline contributes nothing; the request itself still
//! succeeds with whatever the other sources produced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

use catalog::BookCatalog;
use library::{ReadingListSummary, ReadingStore};
use pipeline::Aggregator;
use sources::{
    BookLookup, Candidate, CategorySource, FriendSource, ProfileBuilder, SerendipitySource,
    SimilaritySource, TrendingSource, UserContext,
};

/// Feed size when the caller gives none (or an unusable one)
pub const DEFAULT_LIMIT: usize = 20;

/// Number of lists returned by the lists endpoint by default
pub const DEFAULT_LISTS_LIMIT: usize = 10;

/// Default request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest feed a single request can ask for
pub const MAX_LIMIT: usize = 100;

/// Resolve a requested feed size. Missing or non-positive becomes `default`;
/// anything above [`MAX_LIMIT`] is capped.
pub fn resolve_limit(requested: Option<i64>, default: usize) -> usize {
    requested
        .filter(|&limit| limit > 0)
        .map_or(default, |limit| usize::try_from(limit).unwrap_or(MAX_LIMIT))
        .min(MAX_LIMIT)
}

/// The numeric value of a raw `limit` parameter, if it has one
pub fn limit_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Parse a raw `limit` parameter; anything missing, non-numeric or
/// non-positive becomes `default`.
pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    resolve_limit(limit_param(raw), default)
}

/// How many candidates each source is asked for.
///
/// Shares are 40/25/20/10/5 percent of the limit, truncated. Quota a source
/// can't use is not handed to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceQuotas {
    pub similarity: usize,
    pub friend: usize,
    pub category: usize,
    pub trending: usize,
    pub serendipity: usize,
}

impl SourceQuotas {
    pub fn for_limit(limit: usize) -> Self {
        // Split before multiplying so no limit can overflow
        let share = |percent: usize| limit / 100 * percent + limit % 100 * percent / 100;
        Self {
            similarity: share(40),
            friend: share(25),
            category: share(20),
            trending: share(10),
            serendipity: share(5),
        }
    }
}

/// Final payload of one discover request
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<Candidate>,
    pub count: usize,
}

impl From<Vec<Candidate>> for Recommendations {
    fn from(recommendations: Vec<Candidate>) -> Self {
        Self {
            count: recommendations.len(),
            recommendations,
        }
    }
}

/// Main service that coordinates the recommendation pipeline
pub struct RecommendationService {
    store: Arc<dyn ReadingStore>,
    profiles: ProfileBuilder,
    similarity: SimilaritySource,
    friends: FriendSource,
    category: CategorySource,
    trending: TrendingSource,
    serendipity: SerendipitySource,
    aggregator: Aggregator,
    timeout: Duration,
}

impl RecommendationService {
    /// Create a service with all sources wired to the same store and catalog
    pub fn new(store: Arc<dyn ReadingStore>, catalog: Arc<dyn BookCatalog>) -> Self {
        let lookup = BookLookup::new(Arc::clone(&store), catalog);
        Self {
            profiles: ProfileBuilder::new(Arc::clone(&store)),
            similarity: SimilaritySource::new(lookup.clone()),
            friends: FriendSource::new(Arc::clone(&store)),
            category: CategorySource::new(lookup),
            trending: TrendingSource::new(Arc::clone(&store)),
            serendipity: SerendipitySource::new(Arc::clone(&store)),
            aggregator: Aggregator::new(),
            timeout: DEFAULT_TIMEOUT,
            store,
        }
    }

    /// Configure the per-request deadline (default: 10s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Main entry point: the discover feed for a user, or for a visitor
    /// when `user_id` is `None`.
    ///
    /// A missing or non-positive `limit` means [`DEFAULT_LIMIT`].
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        user_id: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Recommendations> {
        let limit = resolve_limit(limit, DEFAULT_LIMIT);
        let start_time = std::time::Instant::now();
        let deadline = Instant::now() + self.timeout;

        let recommendations = match user_id {
            Some(user_id) => self.personalized(user_id, limit, deadline).await?,
            None => self.anonymous(limit, deadline).await,
        };

        info!(
            "Served {} recommendations (limit {}, identified: {}) in {:.2?}",
            recommendations.len(),
            limit,
            user_id.is_some(),
            start_time.elapsed()
        );
        Ok(recommendations.into())
    }

    /// Trending only; no profile and no social or rating-history sources
    async fn anonymous(&self, limit: usize, deadline: Instant) -> Vec<Candidate> {
        let mut candidates = bounded("trending", deadline, self.trending.get_candidates(limit)).await;
        candidates.truncate(limit);
        candidates
    }

    async fn personalized(
        &self,
        user_id: &str,
        limit: usize,
        deadline: Instant,
    ) -> Result<Vec<Candidate>> {
        let context = match timeout_at(deadline, self.profiles.build_context(user_id)).await {
            Ok(context) => context,
            Err(_) => {
                warn!("Profile for user {} timed out, continuing without it", user_id);
                UserContext::new(user_id)
            }
        };

        let quotas = SourceQuotas::for_limit(limit);
        debug!("Source quotas for limit {}: {:?}", limit, quotas);

        let mut rng = StdRng::from_rng(&mut rand::rng());
        let mut category_rng = StdRng::from_rng(&mut rng);

        let (similar, friends, category, trending, serendipity) = tokio::join!(
            bounded(
                "similarity",
                deadline,
                self.similarity.get_candidates(&context, quotas.similarity)
            ),
            bounded(
                "friend",
                deadline,
                self.friends.get_candidates(&context, quotas.friend)
            ),
            bounded(
                "category",
                deadline,
                self.category
                    .get_candidates(&context, quotas.category, &mut category_rng)
            ),
            bounded(
                "trending",
                deadline,
                self.trending.get_candidates(quotas.trending)
            ),
            bounded(
                "serendipity",
                deadline,
                self.serendipity.get_candidates(quotas.serendipity)
            ),
        );
        info!(
            "Candidates for user {}: similarity={} friend={} category={} trending={} serendipity={}",
            user_id,
            similar.len(),
            friends.len(),
            category.len(),
            trending.len(),
            serendipity.len()
        );

        // Concatenation order decides which duplicate survives
        let candidates: Vec<Candidate> = [similar, friends, category, trending, serendipity]
            .into_iter()
            .flatten()
            .collect();

        self.aggregator
            .dedupe_and_rank(candidates, &context.logged_books, limit, &mut rng)
    }

    /// Popular public reading lists
    #[instrument(skip(self))]
    pub async fn trending_lists(&self, limit: usize) -> Vec<ReadingListSummary> {
        let deadline = Instant::now() + self.timeout;
        match timeout_at(deadline, self.store.trending_lists(limit)).await {
            Ok(Ok(lists)) => lists,
            Ok(Err(e)) => {
                warn!("Failed to load trending lists: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Trending lists query timed out");
                Vec::new()
            }
        }
    }

    /// The user's profile, as the sources see it
    pub async fn profile(&self, user_id: &str) -> UserContext {
        self.profiles.build_context(user_id).await
    }
}

/// Run one source against the request deadline; failure or timeout
/// degrades to an empty list.
async fn bounded<F>(source: &'static str, deadline: Instant, candidates: F) -> Vec<Candidate>
where
    F: Future<Output = Result<Vec<Candidate>>>,
{
    match timeout_at(deadline, candidates).await {
        Ok(Ok(candidates)) => candidates,
        Ok(Err(e)) => {
            warn!("{} source failed: {:#}", source, e);
            Vec::new()
        }
        Err(_) => {
            warn!("{} source timed out", source);
            Vec::new()
        }
    }
}
