//! Deck and flashcard persistence trait.

use async_trait::async_trait;

use crate::error::TrailsResult;
use crate::types::{CardDraft, CardId, Deck, DeckId, Flashcard};

/// Remote authority for decks and flashcards.
///
/// Implementations never retry; every failure is returned to the caller as is.
/// Deleting a deck cascades to its cards on the server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// All decks owned by the current user, newest first.
    async fn list_decks(&self) -> TrailsResult<Vec<Deck>>;

    /// Create a deck. `name` is already validated.
    async fn create_deck(&self, name: &str) -> TrailsResult<Deck>;

    /// Rename a deck. `name` is already validated.
    async fn rename_deck(&self, deck_id: &DeckId, name: &str) -> TrailsResult<Deck>;

    /// Delete a deck and its cards.
    async fn delete_deck(&self, deck_id: &DeckId) -> TrailsResult<()>;

    /// Cards of a deck in server order.
    async fn list_cards(&self, deck_id: &DeckId) -> TrailsResult<Vec<Flashcard>>;

    /// Create a card in a deck. `draft` is already validated.
    async fn create_card(&self, deck_id: &DeckId, draft: &CardDraft) -> TrailsResult<Flashcard>;

    /// Replace a card's question and answer. `draft` is already validated.
    async fn update_card(&self, card_id: &CardId, draft: &CardDraft) -> TrailsResult<Flashcard>;

    /// Delete a card.
    async fn delete_card(&self, card_id: &CardId) -> TrailsResult<()>;
}
