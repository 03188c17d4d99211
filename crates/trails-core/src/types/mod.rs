//! Core types for trails.

mod auth;
mod deck;
mod ids;
mod rating;

pub use auth::{AuthSession, Credentials, Registration, User, MIN_PASSWORD_LEN};
pub use deck::{validate_deck_name, CardDraft, Deck, Flashcard};
pub use ids::{CardId, DeckId, UserId};
pub use rating::{Rating, ReviewProgress, ReviewSubmission};
