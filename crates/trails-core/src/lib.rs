//! trails-core - Core library for trails.
//!
//! This crate provides the types, traits, deck manager and card review state
//! machine of the Brain-Trails flashcard client. Network access goes through
//! the [`DeckStore`] and [`ReviewScheduler`] traits; `trails-client` provides
//! the HTTP implementation.
//!
//! # Example
//!
//! ```ignore
//! use trails_core::{DeckManager, Rating};
//!
//! let manager = DeckManager::new(store, scheduler);
//! manager.create_deck("Biology").await?;
//! manager.create_card("Mitosis?", "Cell division").await?;
//!
//! let review = manager.review();
//! review.flip().await;
//! review.rate(Rating::Good).await?;
//! ```

pub mod config;
pub mod deck;
pub mod error;
pub mod events;
pub mod review;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::ClientConfig;
pub use deck::DeckManager;
pub use error::{ErrorCode, TrailsError, TrailsResult};
pub use events::{EventBus, EventSubscriber, ReviewEvent};
pub use review::{CardReview, FetchOutcome, FetchTicket, ReviewSession, ReviewState, Transition};
pub use traits::{DeckStore, ReviewScheduler};
pub use types::{
    AuthSession, CardDraft, CardId, Credentials, Deck, DeckId, Flashcard, Rating, Registration,
    ReviewProgress, User, UserId,
};
