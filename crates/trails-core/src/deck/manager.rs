//! Deck manager implementation.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{TrailsError, TrailsResult};
use crate::events::{EventBus, ReviewEvent};
use crate::review::{CardReview, FetchOutcome};
use crate::traits::{DeckStore, ReviewScheduler};
use crate::types::{validate_deck_name, CardDraft, Deck, DeckId, Flashcard};

#[derive(Default)]
struct DeckState {
    decks: Vec<Deck>,
    active: Option<DeckId>,
}

/// Owns the deck list and the active deck, and feeds the review session.
pub struct DeckManager {
    store: Arc<dyn DeckStore>,
    review: Arc<CardReview>,
    events: EventBus,
    state: Mutex<DeckState>,
}

impl DeckManager {
    /// Create a manager with a fresh review controller.
    pub fn new(store: Arc<dyn DeckStore>, scheduler: Arc<dyn ReviewScheduler>) -> Self {
        let review = CardReview::new(store.clone(), scheduler);
        Self::with_review(store, review)
    }

    /// Create a manager around an already configured review controller.
    ///
    /// Events from both share the controller's bus.
    pub fn with_review(store: Arc<dyn DeckStore>, review: CardReview) -> Self {
        let events = review.events().clone();
        Self {
            store,
            review: Arc::new(review),
            events,
            state: Mutex::new(DeckState::default()),
        }
    }

    /// The review controller for the active deck.
    pub fn review(&self) -> &Arc<CardReview> {
        &self.review
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Cached deck list from the last fetch or mutation.
    pub async fn decks(&self) -> Vec<Deck> {
        self.state.lock().await.decks.clone()
    }

    pub async fn active_deck(&self) -> Option<DeckId> {
        self.state.lock().await.active.clone()
    }

    /// Fetch all decks and cache them.
    pub async fn list_decks(&self) -> TrailsResult<Vec<Deck>> {
        let decks = self.store.list_decks().await?;
        debug!(count = decks.len(), "Fetched decks");
        self.state.lock().await.decks = decks.clone();
        Ok(decks)
    }

    /// Fetch decks and select the first one when nothing is active.
    pub async fn refresh(&self) -> TrailsResult<Vec<Deck>> {
        let decks = self.list_decks().await?;
        if self.active_deck().await.is_none() {
            if let Some(first) = decks.first() {
                self.select_deck(&first.id).await?;
            }
        }
        Ok(decks)
    }

    /// Create a deck and make it active.
    pub async fn create_deck(&self, name: &str) -> TrailsResult<Deck> {
        let name = validate_deck_name(name)?;
        let deck = self.store.create_deck(&name).await?;
        info!(deck_id = %deck.id, name = %deck.name, "Deck created");

        self.state.lock().await.decks.insert(0, deck.clone());
        self.select_deck(&deck.id).await?;
        Ok(deck)
    }

    /// Rename a deck.
    pub async fn rename_deck(&self, deck_id: &DeckId, name: &str) -> TrailsResult<Deck> {
        let name = validate_deck_name(name)?;
        let deck = self.store.rename_deck(deck_id, &name).await?;
        info!(deck_id = %deck_id, name = %deck.name, "Deck renamed");

        let mut state = self.state.lock().await;
        if let Some(cached) = state.decks.iter_mut().find(|d| &d.id == deck_id) {
            cached.name = deck.name.clone();
        }
        Ok(deck)
    }

    /// Delete a deck and its cards. Deleting the active deck clears the
    /// selection.
    pub async fn delete_deck(&self, deck_id: &DeckId) -> TrailsResult<()> {
        self.store.delete_deck(deck_id).await?;
        info!(deck_id = %deck_id, "Deck deleted");

        let was_active = {
            let mut state = self.state.lock().await;
            state.decks.retain(|d| &d.id != deck_id);
            if state.active.as_ref() == Some(deck_id) {
                state.active = None;
                true
            } else {
                false
            }
        };
        if was_active {
            self.review.switch_deck(None).await;
        }
        Ok(())
    }

    /// Add a card to the active deck and reload its cards.
    pub async fn create_card(&self, question: &str, answer: &str) -> TrailsResult<Flashcard> {
        let draft = CardDraft::new(question, answer).validated()?;
        let deck_id = self
            .active_deck()
            .await
            .ok_or_else(|| TrailsError::invalid_state("Select a deck before adding cards"))?;

        let card = self.store.create_card(&deck_id, &draft).await?;
        info!(deck_id = %deck_id, card_id = %card.id, "Flashcard created");

        {
            let mut state = self.state.lock().await;
            if let Some(deck) = state.decks.iter_mut().find(|d| d.id == deck_id) {
                deck.card_count += 1;
            }
        }
        if self.review.deck_id().await.as_ref() == Some(&deck_id) {
            self.review.refetch().await?;
        }
        Ok(card)
    }

    /// Make `deck_id` active and load its cards into the review session.
    ///
    /// Returns [`FetchOutcome::Stale`] when another selection happened while
    /// the cards were in flight; the session then shows the newer deck. A
    /// fetch error for a superseded selection is dropped the same way.
    pub async fn select_deck(&self, deck_id: &DeckId) -> TrailsResult<FetchOutcome> {
        self.state.lock().await.active = Some(deck_id.clone());
        let ticket = self
            .review
            .switch_deck(Some(deck_id.clone()))
            .await
            .ok_or_else(|| TrailsError::Internal("no fetch ticket for selected deck".to_string()))?;
        info!(deck_id = %deck_id, "Deck selected");
        self.events.emit(ReviewEvent::DeckSelected {
            deck_id: deck_id.clone(),
            timestamp: Utc::now(),
        });

        match self.store.list_cards(deck_id).await {
            Ok(cards) => {
                let count = cards.len();
                let outcome = self.review.load_cards(ticket, cards).await;
                if let FetchOutcome::Applied { .. } = outcome {
                    let mut state = self.state.lock().await;
                    if let Some(deck) = state.decks.iter_mut().find(|d| &d.id == deck_id) {
                        deck.card_count = count;
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                if !self.review.is_current(&ticket).await {
                    debug!(deck_id = %deck_id, error = %e, "Ignoring failed fetch for superseded deck");
                    return Ok(FetchOutcome::Stale);
                }
                warn!(deck_id = %deck_id, error = %e, "Failed to fetch cards");
                Err(e)
            }
        }
    }
}
