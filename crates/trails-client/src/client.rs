//! Deck, flashcard and review endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use trails_core::error::TrailsResult;
use trails_core::traits::{DeckStore, ReviewScheduler};
use trails_core::types::{
    AuthSession, CardDraft, CardId, Deck, DeckId, Flashcard, Rating, ReviewProgress,
    ReviewSubmission,
};
use trails_core::ClientConfig;

use crate::transport::{build_http, headers, send_empty, send_json};

/// Authenticated client for the study API.
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    session: AuthSession,
}

impl ApiClient {
    /// Create a client that acts on behalf of `session`.
    pub fn new(config: &ClientConfig, session: AuthSession) -> TrailsResult<Self> {
        Ok(Self {
            client: build_http(config)?,
            config: config.clone(),
            session,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Give up the session, e.g. to log out.
    pub fn into_session(self) -> AuthSession {
        self.session
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    fn deck_url(&self, deck_id: &DeckId) -> String {
        self.url(&format!("decks/{}", deck_id))
    }

    fn cards_url(&self, deck_id: &DeckId) -> String {
        self.url(&format!("decks/{}/flashcards", deck_id))
    }

    fn card_url(&self, card_id: &CardId) -> String {
        self.url(&format!("flashcards/{}", card_id))
    }
}

#[async_trait]
impl DeckStore for ApiClient {
    async fn list_decks(&self) -> TrailsResult<Vec<Deck>> {
        let request = self.client.get(self.url("decks")).headers(headers(Some(&self.session))?);
        send_json("List decks", request).await
    }

    async fn create_deck(&self, name: &str) -> TrailsResult<Deck> {
        let request = self
            .client
            .post(self.url("decks"))
            .headers(headers(Some(&self.session))?)
            .json(&json!({ "name": name }));
        send_json("Create deck", request).await
    }

    async fn rename_deck(&self, deck_id: &DeckId, name: &str) -> TrailsResult<Deck> {
        let request = self
            .client
            .put(self.deck_url(deck_id))
            .headers(headers(Some(&self.session))?)
            .json(&json!({ "name": name }));
        send_json("Rename deck", request).await
    }

    async fn delete_deck(&self, deck_id: &DeckId) -> TrailsResult<()> {
        let request = self
            .client
            .delete(self.deck_url(deck_id))
            .headers(headers(Some(&self.session))?);
        send_empty("Delete deck", request).await
    }

    async fn list_cards(&self, deck_id: &DeckId) -> TrailsResult<Vec<Flashcard>> {
        let request = self
            .client
            .get(self.cards_url(deck_id))
            .headers(headers(Some(&self.session))?);
        let cards: Vec<Flashcard> = send_json("List flashcards", request).await?;
        debug!(deck_id = %deck_id, count = cards.len(), "Fetched flashcards");
        Ok(cards)
    }

    async fn create_card(&self, deck_id: &DeckId, draft: &CardDraft) -> TrailsResult<Flashcard> {
        let request = self
            .client
            .post(self.cards_url(deck_id))
            .headers(headers(Some(&self.session))?)
            .json(draft);
        send_json("Create flashcard", request).await
    }

    async fn update_card(&self, card_id: &CardId, draft: &CardDraft) -> TrailsResult<Flashcard> {
        let request = self
            .client
            .put(self.card_url(card_id))
            .headers(headers(Some(&self.session))?)
            .json(draft);
        send_json("Update flashcard", request).await
    }

    async fn delete_card(&self, card_id: &CardId) -> TrailsResult<()> {
        let request = self
            .client
            .delete(self.card_url(card_id))
            .headers(headers(Some(&self.session))?);
        send_empty("Delete flashcard", request).await
    }
}

#[async_trait]
impl ReviewScheduler for ApiClient {
    async fn submit_review(&self, card_id: &CardId, rating: Rating) -> TrailsResult<ReviewProgress> {
        let request = self
            .client
            .post(self.url(&format!("flashcards/{}/review", card_id)))
            .headers(headers(Some(&self.session))?)
            .json(&ReviewSubmission::from(rating));
        send_json("Submit review", request).await
    }
}
