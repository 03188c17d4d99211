//! Deck and flashcard types.

use serde::{Deserialize, Serialize};

use super::ids::{CardId, DeckId};
use crate::error::{TrailsError, TrailsResult};

/// A named collection of flashcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    /// Unique identifier for the deck.
    pub id: DeckId,
    /// Display name.
    pub name: String,
    /// Number of cards in the deck, as counted by the server.
    #[serde(rename = "flashcard_count", alias = "card_count", default)]
    pub card_count: usize,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Deck {
    /// Create a new deck.
    pub fn new(id: impl Into<DeckId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            card_count: 0,
            created_at: None,
        }
    }

    /// Set the card count.
    pub fn with_card_count(mut self, count: usize) -> Self {
        self.card_count = count;
        self
    }
}

/// A question/answer pair reviewed for recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Unique identifier for the card.
    pub id: CardId,
    /// Deck this card belongs to.
    pub deck_id: DeckId,
    /// Prompt side.
    pub question: String,
    /// Answer side.
    pub answer: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Flashcard {
    /// Create a new flashcard.
    pub fn new(
        id: impl Into<CardId>,
        deck_id: impl Into<DeckId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            deck_id: deck_id.into(),
            question: question.into(),
            answer: answer.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// The current content as an editable draft.
    pub fn draft(&self) -> CardDraft {
        CardDraft {
            question: self.question.clone(),
            answer: self.answer.clone(),
        }
    }
}

/// Question and answer text for creating or updating a card.
///
/// This is also the request body of the create and update endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub question: String,
    pub answer: String,
}

impl CardDraft {
    /// Create a new draft.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Validate and trim both sides.
    ///
    /// Returns the trimmed draft, or a validation error naming the first blank
    /// side.
    pub fn validated(&self) -> TrailsResult<CardDraft> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(TrailsError::missing_field("question"));
        }
        let answer = self.answer.trim();
        if answer.is_empty() {
            return Err(TrailsError::missing_field("answer"));
        }
        Ok(CardDraft::new(question, answer))
    }
}

/// Validate and trim a deck name.
pub fn validate_deck_name(name: &str) -> TrailsResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrailsError::missing_field("deck name"));
    }
    Ok(trimmed.to_string())
}
