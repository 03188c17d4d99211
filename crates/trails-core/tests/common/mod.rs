//! In-memory store and scheduler shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use trails_core::{
    CardDraft, CardId, Deck, DeckId, DeckStore, Flashcard, Rating, ReviewProgress,
    ReviewScheduler, TrailsError, TrailsResult,
};

/// A recorded call against the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListDecks,
    CreateDeck(String),
    RenameDeck(DeckId, String),
    DeleteDeck(DeckId),
    ListCards(DeckId),
    CreateCard(DeckId, CardDraft),
    UpdateCard(CardId, CardDraft),
    DeleteCard(CardId),
    SubmitReview(CardId, u8),
}

#[derive(Default)]
struct Inner {
    decks: Vec<Deck>,
    cards: Vec<Flashcard>,
    next_id: i64,
    calls: Vec<Call>,
    /// Held `list_cards` responses, per deck, released in FIFO order.
    gates: HashMap<DeckId, VecDeque<oneshot::Receiver<()>>>,
    /// Errors returned by the next matching call.
    fail_update: Option<TrailsError>,
    fail_delete: Option<TrailsError>,
    fail_review: Option<TrailsError>,
    fail_list: HashMap<DeckId, TrailsError>,
}

/// Fake remote authority holding decks and cards in memory.
#[derive(Clone, Default)]
pub struct FakeServer {
    inner: Arc<Mutex<Inner>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_deck(&self, name: &str, cards: &[(&str, &str)]) -> DeckId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let deck_id = DeckId::from(inner.next_id);
        inner.decks.push(Deck::new(deck_id.clone(), name));
        for (q, a) in cards {
            inner.next_id += 1;
            let card = Flashcard::new(inner.next_id, deck_id.clone(), *q, *a);
            inner.cards.push(card);
        }
        deck_id
    }

    /// Delete a card behind the client's back.
    pub fn remove_card_remotely(&self, card_id: &CardId) {
        self.inner.lock().unwrap().cards.retain(|c| &c.id != card_id);
    }

    /// Hold the next `list_cards` for `deck_id` until the sender fires.
    pub fn hold_list_cards(&self, deck_id: &DeckId) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .gates
            .entry(deck_id.clone())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn fail_next_update(&self, err: TrailsError) {
        self.inner.lock().unwrap().fail_update = Some(err);
    }

    pub fn fail_next_delete(&self, err: TrailsError) {
        self.inner.lock().unwrap().fail_delete = Some(err);
    }

    /// Make the next `list_cards` for `deck_id` fail.
    pub fn fail_next_list_cards(&self, deck_id: &DeckId, err: TrailsError) {
        self.inner.lock().unwrap().fail_list.insert(deck_id.clone(), err);
    }

    pub fn fail_next_review(&self, err: TrailsError) {
        self.inner.lock().unwrap().fail_review = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl DeckStore for FakeServer {
    async fn list_decks(&self) -> TrailsResult<Vec<Deck>> {
        self.record(Call::ListDecks);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .decks
            .iter()
            .map(|d| {
                let count = inner.cards.iter().filter(|c| c.deck_id == d.id).count();
                d.clone().with_card_count(count)
            })
            .collect())
    }

    async fn create_deck(&self, name: &str) -> TrailsResult<Deck> {
        self.record(Call::CreateDeck(name.to_string()));
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let deck = Deck::new(inner.next_id, name);
        inner.decks.insert(0, deck.clone());
        Ok(deck)
    }

    async fn rename_deck(&self, deck_id: &DeckId, name: &str) -> TrailsResult<Deck> {
        self.record(Call::RenameDeck(deck_id.clone(), name.to_string()));
        let mut inner = self.inner.lock().unwrap();
        let deck = inner
            .decks
            .iter_mut()
            .find(|d| &d.id == deck_id)
            .ok_or_else(|| TrailsError::deck_not_found(deck_id.as_str()))?;
        deck.name = name.to_string();
        Ok(deck.clone())
    }

    async fn delete_deck(&self, deck_id: &DeckId) -> TrailsResult<()> {
        self.record(Call::DeleteDeck(deck_id.clone()));
        let mut inner = self.inner.lock().unwrap();
        inner.decks.retain(|d| &d.id != deck_id);
        inner.cards.retain(|c| &c.deck_id != deck_id);
        Ok(())
    }

    async fn list_cards(&self, deck_id: &DeckId) -> TrailsResult<Vec<Flashcard>> {
        self.record(Call::ListCards(deck_id.clone()));
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.gates.get_mut(deck_id).and_then(|q| q.pop_front())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.fail_list.remove(deck_id) {
            return Err(err);
        }
        Ok(inner
            .cards
            .iter()
            .filter(|c| &c.deck_id == deck_id)
            .cloned()
            .collect())
    }

    async fn create_card(&self, deck_id: &DeckId, draft: &CardDraft) -> TrailsResult<Flashcard> {
        self.record(Call::CreateCard(deck_id.clone(), draft.clone()));
        let mut inner = self.inner.lock().unwrap();
        if !inner.decks.iter().any(|d| &d.id == deck_id) {
            return Err(TrailsError::deck_not_found(deck_id.as_str()));
        }
        inner.next_id += 1;
        let card = Flashcard::new(
            inner.next_id,
            deck_id.clone(),
            draft.question.clone(),
            draft.answer.clone(),
        );
        inner.cards.push(card.clone());
        Ok(card)
    }

    async fn update_card(&self, card_id: &CardId, draft: &CardDraft) -> TrailsResult<Flashcard> {
        self.record(Call::UpdateCard(card_id.clone(), draft.clone()));
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.fail_update.take() {
            return Err(err);
        }
        let card = inner
            .cards
            .iter_mut()
            .find(|c| &c.id == card_id)
            .ok_or_else(|| TrailsError::card_not_found(card_id.as_str()))?;
        card.question = draft.question.clone();
        card.answer = draft.answer.clone();
        Ok(card.clone())
    }

    async fn delete_card(&self, card_id: &CardId) -> TrailsResult<()> {
        self.record(Call::DeleteCard(card_id.clone()));
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.fail_delete.take() {
            return Err(err);
        }
        let before = inner.cards.len();
        inner.cards.retain(|c| &c.id != card_id);
        if inner.cards.len() == before {
            return Err(TrailsError::card_not_found(card_id.as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewScheduler for FakeServer {
    async fn submit_review(&self, card_id: &CardId, rating: Rating) -> TrailsResult<ReviewProgress> {
        self.record(Call::SubmitReview(card_id.clone(), rating.quality()));
        if let Some(err) = self.inner.lock().unwrap().fail_review.take() {
            return Err(err);
        }
        Ok(ReviewProgress {
            flashcard_id: Some(card_id.clone()),
            interval: Some(1),
            repetitions: Some(1),
            ..Default::default()
        })
    }
}
