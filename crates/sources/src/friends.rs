//! Friend Source - In-network social proof
//!
//! "Loved by N of your friends": books rated >= 4 by people the user
//! follows, which the user hasn't logged yet. Books loved by more friends
//! come first; the reason carries the friend count.

use crate::types::{Candidate, HIGH_RATING, RecommendationReason, UserContext};
use anyhow::Result;
use library::ReadingStore;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Friend source generates candidates from the follow graph
pub struct FriendSource {
    store: Arc<dyn ReadingStore>,

    /// Minimum friend rating for a book to count as "loved"
    min_rating: u8,
}

impl FriendSource {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            min_rating: HIGH_RATING,
        }
    }

    /// Configure the minimum friend rating (default: 4)
    pub fn with_min_rating(mut self, rating: u8) -> Self {
        self.min_rating = rating;
        self
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn get_candidates(&self, context: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let picks = self
            .store
            .friend_favorites(&context.user_id, self.min_rating, limit)
            .await?;
        debug!("Friends loved {} unlogged books", picks.len());

        let mut candidates = Vec::with_capacity(picks.len());
        for pick in picks {
            // Picks without a books row can't be shown
            let book = match self.store.book(&pick.book_id).await {
                Ok(Some(book)) => book,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to load friend pick {}: {}", pick.book_id, e);
                    continue;
                }
            };
            candidates.push(Candidate::new(
                book,
                RecommendationReason::FriendsLoved(pick.friend_count),
            ));
        }

        debug!("Generated {} Friend candidates", candidates.len());
        Ok(candidates)
    }
}
