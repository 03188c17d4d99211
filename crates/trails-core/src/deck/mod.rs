//! Deck management.
//!
//! The [`DeckManager`] caches the deck list, tracks the active deck and loads
//! its cards into the shared [`CardReview`](crate::review::CardReview).

mod manager;

pub use manager::DeckManager;
