//! Events emitted by the deck manager and the review controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CardId, DeckId, Rating};

/// Something observable happened in the review loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// A deck became active.
    DeckSelected {
        deck_id: DeckId,
        timestamp: DateTime<Utc>,
    },
    /// A fetch result replaced the session's cards.
    CardsLoaded {
        deck_id: DeckId,
        count: usize,
        timestamp: DateTime<Utc>,
    },
    /// A fetch result arrived for a selection that is no longer current.
    StaleResponseDiscarded {
        deck_id: DeckId,
        generation: u64,
        timestamp: DateTime<Utc>,
    },
    /// The answer side was shown or hidden.
    Flipped {
        card_id: CardId,
        revealed: bool,
        timestamp: DateTime<Utc>,
    },
    /// The session moved to another card.
    Moved {
        position: usize,
        timestamp: DateTime<Utc>,
    },
    /// A card's question or answer changed on the server.
    CardUpdated {
        card_id: CardId,
        timestamp: DateTime<Utc>,
    },
    /// A card was deleted on the server.
    CardDeleted {
        card_id: CardId,
        timestamp: DateTime<Utc>,
    },
    /// The scheduler accepted a rating.
    Rated {
        card_id: CardId,
        rating: Rating,
        timestamp: DateTime<Utc>,
    },
    /// The scheduler did not accept a rating. Navigation is unaffected.
    RatingFailed {
        card_id: CardId,
        rating: Rating,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ReviewEvent {
    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DeckSelected { .. } => "deck.selected",
            Self::CardsLoaded { .. } => "cards.loaded",
            Self::StaleResponseDiscarded { .. } => "cards.stale",
            Self::Flipped { .. } => "card.flipped",
            Self::Moved { .. } => "session.moved",
            Self::CardUpdated { .. } => "card.updated",
            Self::CardDeleted { .. } => "card.deleted",
            Self::Rated { .. } => "card.rated",
            Self::RatingFailed { .. } => "card.rating_failed",
        }
    }

    /// Get the card this event relates to, if any
    pub fn card_id(&self) -> Option<&CardId> {
        match self {
            Self::Flipped { card_id, .. }
            | Self::CardUpdated { card_id, .. }
            | Self::CardDeleted { card_id, .. }
            | Self::Rated { card_id, .. }
            | Self::RatingFailed { card_id, .. } => Some(card_id),
            _ => None,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::DeckSelected { timestamp, .. }
            | Self::CardsLoaded { timestamp, .. }
            | Self::StaleResponseDiscarded { timestamp, .. }
            | Self::Flipped { timestamp, .. }
            | Self::Moved { timestamp, .. }
            | Self::CardUpdated { timestamp, .. }
            | Self::CardDeleted { timestamp, .. }
            | Self::Rated { timestamp, .. }
            | Self::RatingFailed { timestamp, .. } => *timestamp,
        }
    }
}
