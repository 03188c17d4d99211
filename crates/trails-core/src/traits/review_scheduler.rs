//! Spaced-repetition scheduler trait.

use async_trait::async_trait;

use crate::error::TrailsResult;
use crate::types::{CardId, Rating, ReviewProgress};

/// Remote authority computing the next due date from a rating.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewScheduler: Send + Sync {
    /// Record a review of `card_id` and return the updated schedule.
    async fn submit_review(&self, card_id: &CardId, rating: Rating) -> TrailsResult<ReviewProgress>;
}
