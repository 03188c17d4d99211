//! Async review controller.
//!
//! [`CardReview`] owns the [`ReviewSession`] and is the only writer of it. It
//! issues the network calls for edit, delete and rating, runs the flip/advance
//! animation delay, and applies card fetches through the stale-response guard.
//! The internal lock is never held across an `.await` on the network or the
//! timer, so operations interleave the way UI callbacks do.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{TrailsError, TrailsResult};
use crate::events::{EventBus, ReviewEvent};
use crate::traits::{DeckStore, ReviewScheduler};
use crate::types::{CardDraft, CardId, DeckId, Flashcard, Rating, ReviewProgress};

use super::session::ReviewSession;
use super::state::ReviewState;

/// Tag attached to a card fetch when it is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    deck_id: DeckId,
    generation: u64,
}

impl FetchTicket {
    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The session now holds these cards.
    Applied { count: usize },
    /// The result was older than the current selection and was dropped.
    Stale,
}

#[derive(Default)]
struct ReviewInner {
    session: ReviewSession,
    deck_id: Option<DeckId>,
    /// Last generation handed out.
    issued: u64,
    /// Oldest generation still acceptable for the current deck.
    floor: u64,
    /// Generation of the fetch currently shown.
    applied: u64,
    /// Cards with an outstanding edit or delete.
    pending: HashSet<CardId>,
}

impl ReviewInner {
    fn issue(&mut self, deck_id: DeckId) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            deck_id,
            generation: self.issued,
        }
    }

    fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.deck_id.as_ref() == Some(&ticket.deck_id)
            && ticket.generation >= self.floor
            && ticket.generation > self.applied
    }

    /// The current card, if the state allows acting on it.
    fn actionable_card(&self, action: &str) -> TrailsResult<Flashcard> {
        match self.session.state() {
            ReviewState::Viewing { .. } | ReviewState::Revealed { .. } | ReviewState::Editing { .. } => {
                self.session.current_card().cloned().ok_or_else(|| {
                    TrailsError::Internal("review position out of range".to_string())
                })
            }
            other => Err(TrailsError::invalid_state(format!(
                "Cannot {} while {}",
                action,
                other.name()
            ))),
        }
    }

    fn is_showing(&self, deck_id: &Option<DeckId>, card_id: &CardId) -> bool {
        &self.deck_id == deck_id && self.session.current_card().map(|c| &c.id) == Some(card_id)
    }
}

/// Client-local controller cycling through a deck's cards.
pub struct CardReview {
    store: Arc<dyn DeckStore>,
    scheduler: Arc<dyn ReviewScheduler>,
    events: EventBus,
    transition_delay: Duration,
    inner: Mutex<ReviewInner>,
}

impl CardReview {
    /// Default animation length.
    pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(300);

    /// Create a controller with no deck.
    pub fn new(store: Arc<dyn DeckStore>, scheduler: Arc<dyn ReviewScheduler>) -> Self {
        Self {
            store,
            scheduler,
            events: EventBus::new(),
            transition_delay: Self::DEFAULT_TRANSITION_DELAY,
            inner: Mutex::new(ReviewInner::default()),
        }
    }

    /// Publish events on `events` instead of a private bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Set the flip/advance animation length.
    pub fn with_transition_delay(mut self, delay: Duration) -> Self {
        self.transition_delay = delay;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> ReviewSession {
        self.inner.lock().await.session.clone()
    }

    pub async fn state(&self) -> ReviewState {
        self.inner.lock().await.session.state().clone()
    }

    pub async fn current_card(&self) -> Option<Flashcard> {
        self.inner.lock().await.session.current_card().cloned()
    }

    /// Deck the session belongs to.
    pub async fn deck_id(&self) -> Option<DeckId> {
        self.inner.lock().await.deck_id.clone()
    }

    /// Whether an edit or delete for `card_id` is outstanding.
    pub async fn is_pending(&self, card_id: &CardId) -> bool {
        self.inner.lock().await.pending.contains(card_id)
    }

    /// Point the session at another deck (or none), discarding the snapshot.
    ///
    /// Every fetch issued before this call becomes stale.
    pub(crate) async fn switch_deck(&self, deck_id: Option<DeckId>) -> Option<FetchTicket> {
        let mut inner = self.inner.lock().await;
        inner.session.load_cards(Vec::new());
        inner.deck_id = deck_id.clone();
        let ticket = deck_id.map(|id| inner.issue(id));
        inner.floor = inner.issued;
        ticket
    }

    /// Tag a new fetch for the session's deck.
    pub async fn begin_fetch(&self) -> TrailsResult<FetchTicket> {
        let mut inner = self.inner.lock().await;
        let deck_id = inner
            .deck_id
            .clone()
            .ok_or_else(|| TrailsError::invalid_state("No deck selected"))?;
        Ok(inner.issue(deck_id))
    }

    /// Whether a result for `ticket` would still be applied.
    pub async fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.inner.lock().await.accepts(ticket)
    }

    /// Apply a fetch result, unless a newer selection or fetch superseded it.
    pub async fn load_cards(&self, ticket: FetchTicket, cards: Vec<Flashcard>) -> FetchOutcome {
        let mut inner = self.inner.lock().await;
        if !inner.accepts(&ticket) {
            debug!(
                deck_id = %ticket.deck_id,
                generation = ticket.generation,
                "Discarding stale card fetch"
            );
            self.events.emit(ReviewEvent::StaleResponseDiscarded {
                deck_id: ticket.deck_id,
                generation: ticket.generation,
                timestamp: Utc::now(),
            });
            return FetchOutcome::Stale;
        }

        let count = cards.len();
        inner.applied = ticket.generation;
        inner.session.load_cards(cards);
        debug!(deck_id = %ticket.deck_id, count, "Loaded cards");
        self.events.emit(ReviewEvent::CardsLoaded {
            deck_id: ticket.deck_id,
            count,
            timestamp: Utc::now(),
        });
        FetchOutcome::Applied { count }
    }

    /// Fetch the session's deck again and load the result.
    pub async fn refetch(&self) -> TrailsResult<FetchOutcome> {
        let ticket = self.begin_fetch().await?;
        let cards = self.store.list_cards(&ticket.deck_id).await?;
        Ok(self.load_cards(ticket, cards).await)
    }

    /// Toggle between question and answer.
    pub async fn flip(&self) -> ReviewState {
        self.animate(ReviewSession::begin_flip, true).await
    }

    /// Move to the next card, wrapping at the end.
    pub async fn next(&self) -> ReviewState {
        self.animate(ReviewSession::begin_next, false).await
    }

    /// Move to the previous card, wrapping at the start.
    pub async fn previous(&self) -> ReviewState {
        self.animate(ReviewSession::begin_previous, false).await
    }

    async fn animate(&self, begin: fn(&mut ReviewSession) -> Option<u64>, flip: bool) -> ReviewState {
        let ticket = {
            let mut inner = self.inner.lock().await;
            match begin(&mut inner.session) {
                Some(ticket) => ticket,
                None => return inner.session.state().clone(),
            }
        };

        if !self.transition_delay.is_zero() {
            tokio::time::sleep(self.transition_delay).await;
        }

        let mut inner = self.inner.lock().await;
        if inner.session.finish_transition(ticket) {
            let timestamp = Utc::now();
            match (inner.session.current_card(), inner.session.position()) {
                (Some(card), _) if flip => self.events.emit(ReviewEvent::Flipped {
                    card_id: card.id.clone(),
                    revealed: inner.session.is_revealed(),
                    timestamp,
                }),
                (_, Some(position)) => self.events.emit(ReviewEvent::Moved { position, timestamp }),
                _ => {}
            }
        }
        inner.session.state().clone()
    }

    /// Open the editing overlay on the current card.
    pub async fn begin_edit(&self) -> TrailsResult<()> {
        self.inner.lock().await.session.begin_edit()
    }

    /// Close the editing overlay without saving.
    pub async fn cancel_edit(&self) -> bool {
        self.inner.lock().await.session.cancel_edit()
    }

    /// Save new text for the current card.
    ///
    /// Blank input fails with a validation error before any request and
    /// leaves the overlay open with the draft. A successful save patches the
    /// card in the snapshot, then refetches the deck and lands on the first
    /// card, since the server may reorder. If that refetch fails the save still
    /// counts and the patched snapshot stays. A `NotFound` also triggers the
    /// refetch; other failures keep the overlay open with the message shown
    /// inline.
    pub async fn edit(&self, question: &str, answer: &str) -> TrailsResult<()> {
        let raw = CardDraft::new(question, answer);

        let (card_id, deck_id, draft) = {
            let mut inner = self.inner.lock().await;
            let card = inner.actionable_card("edit")?;
            inner.session.begin_edit()?;
            inner.session.set_draft(raw.clone())?;

            let draft = match raw.validated() {
                Ok(draft) => draft,
                Err(e) => {
                    inner.session.set_edit_error(e.to_string());
                    return Err(e);
                }
            };
            if !inner.pending.insert(card.id.clone()) {
                let err = TrailsError::pending(card.id);
                inner.session.set_edit_error(err.to_string());
                return Err(err);
            }
            (card.id, inner.deck_id.clone(), draft)
        };

        let result = self.store.update_card(&card_id, &draft).await;

        let same_deck = {
            let mut inner = self.inner.lock().await;
            inner.pending.remove(&card_id);
            let same_deck = inner.deck_id == deck_id;
            match &result {
                Ok(updated) => {
                    if inner.is_showing(&deck_id, &card_id) {
                        inner.session.cancel_edit();
                    }
                    if same_deck {
                        inner.session.replace_card(updated.clone());
                    }
                }
                Err(e) if e.is_not_found() => {
                    if inner.is_showing(&deck_id, &card_id) {
                        inner.session.cancel_edit();
                    }
                }
                Err(e) => {
                    if inner.is_showing(&deck_id, &card_id) {
                        inner.session.set_edit_error(e.to_string());
                    }
                }
            }
            same_deck
        };

        match result {
            Ok(_) => {
                info!(card_id = %card_id, "Flashcard updated");
                self.events.emit(ReviewEvent::CardUpdated {
                    card_id: card_id.clone(),
                    timestamp: Utc::now(),
                });
                if same_deck {
                    if let Err(refetch_err) = self.refetch().await {
                        warn!(
                            card_id = %card_id,
                            error = %refetch_err,
                            "Refetch after update failed, keeping the patched snapshot"
                        );
                    }
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(card_id = %card_id, "Edited card no longer exists, refetching deck");
                if same_deck {
                    if let Err(refetch_err) = self.refetch().await {
                        warn!(error = %refetch_err, "Refetch after missing card failed");
                    }
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the current card.
    ///
    /// On success the card leaves the snapshot and the position is clamped.
    /// A `NotFound` means the snapshot is out of date, so the deck is
    /// refetched instead.
    pub async fn delete(&self) -> TrailsResult<()> {
        let (card_id, deck_id) = {
            let mut inner = self.inner.lock().await;
            let card = inner.actionable_card("delete")?;
            if !inner.pending.insert(card.id.clone()) {
                return Err(TrailsError::pending(card.id));
            }
            (card.id, inner.deck_id.clone())
        };

        let result = self.store.delete_card(&card_id).await;

        let same_deck = {
            let mut inner = self.inner.lock().await;
            inner.pending.remove(&card_id);
            let same_deck = inner.deck_id == deck_id;
            match &result {
                Ok(()) if same_deck => {
                    inner.session.remove_card(&card_id);
                }
                Err(e) if !e.is_not_found() && inner.is_showing(&deck_id, &card_id) => {
                    inner.session.set_edit_error(e.to_string());
                }
                _ => {}
            }
            same_deck
        };

        match result {
            Ok(()) => {
                info!(card_id = %card_id, "Flashcard deleted");
                self.events.emit(ReviewEvent::CardDeleted {
                    card_id,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(card_id = %card_id, "Deleted card no longer exists, refetching deck");
                if same_deck {
                    if let Err(refetch_err) = self.refetch().await {
                        warn!(error = %refetch_err, "Refetch after missing card failed");
                    }
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Rate the revealed card.
    ///
    /// Local state never changes; a failure is logged, published as
    /// [`ReviewEvent::RatingFailed`] and returned, and is not retried.
    pub async fn rate(&self, rating: Rating) -> TrailsResult<ReviewProgress> {
        let card_id = {
            let inner = self.inner.lock().await;
            match inner.session.state() {
                ReviewState::Revealed { .. } => inner
                    .session
                    .current_card()
                    .map(|c| c.id.clone())
                    .ok_or_else(|| TrailsError::Internal("review position out of range".to_string()))?,
                other => {
                    return Err(TrailsError::invalid_state(format!(
                        "Reveal the answer before rating (currently {})",
                        other.name()
                    )))
                }
            }
        };

        match self.scheduler.submit_review(&card_id, rating).await {
            Ok(progress) => {
                debug!(card_id = %card_id, quality = rating.quality(), "Review recorded");
                self.events.emit(ReviewEvent::Rated {
                    card_id,
                    rating,
                    timestamp: Utc::now(),
                });
                Ok(progress)
            }
            Err(e) => {
                warn!(card_id = %card_id, error = %e, "Review submission failed");
                self.events.emit(ReviewEvent::RatingFailed {
                    card_id,
                    rating,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockDeckStore, MockReviewScheduler};

    fn card(id: &str) -> Flashcard {
        Flashcard::new(id, "d1", format!("Q{}", id), format!("A{}", id))
    }

    async fn loaded(store: MockDeckStore, scheduler: MockReviewScheduler, cards: Vec<Flashcard>) -> CardReview {
        let review = CardReview::new(Arc::new(store), Arc::new(scheduler))
            .with_transition_delay(Duration::ZERO);
        let ticket = review.switch_deck(Some(DeckId::from("d1"))).await.unwrap();
        review.load_cards(ticket, cards).await;
        review
    }

    #[tokio::test]
    async fn test_rate_requires_revealed() {
        let review = loaded(MockDeckStore::new(), MockReviewScheduler::new(), vec![card("1")]).await;
        let err = review.rate(Rating::Good).await.unwrap_err();
        assert!(matches!(err, TrailsError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_rate_sends_quality_and_keeps_state() {
        let mut scheduler = MockReviewScheduler::new();
        scheduler
            .expect_submit_review()
            .withf(|id, rating| id.as_str() == "1" && rating.quality() == 4)
            .times(1)
            .returning(|_, _| Ok(ReviewProgress::default()));

        let review = loaded(MockDeckStore::new(), scheduler, vec![card("1"), card("2")]).await;
        review.flip().await;
        review.rate(Rating::Good).await.unwrap();
        assert_eq!(review.state().await, ReviewState::Revealed { position: 0 });
    }

    #[tokio::test]
    async fn test_rate_failure_is_reported_without_rollback() {
        let mut scheduler = MockReviewScheduler::new();
        scheduler
            .expect_submit_review()
            .returning(|_, _| Err(TrailsError::network("connection reset")));

        let review = loaded(MockDeckStore::new(), scheduler, vec![card("1"), card("2")]).await;
        let mut events = review.events().subscribe();
        review.flip().await;
        assert!(review.rate(Rating::Hard).await.is_err());
        assert_eq!(review.state().await, ReviewState::Revealed { position: 0 });

        assert_eq!(review.next().await, ReviewState::Viewing { position: 1 });
        let failed = events
            .drain()
            .into_iter()
            .any(|e| matches!(e, ReviewEvent::RatingFailed { rating: Rating::Hard, .. }));
        assert!(failed);
    }

    #[tokio::test]
    async fn test_edit_validation_makes_no_request() {
        // No expectations: any store call panics.
        let review = loaded(MockDeckStore::new(), MockReviewScheduler::new(), vec![card("1")]).await;
        let err = review.edit("  ", "answer").await.unwrap_err();
        assert!(err.is_local());
        match review.state().await {
            ReviewState::Editing { draft, error, .. } => {
                assert_eq!(draft.answer, "answer");
                assert!(error.is_some());
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_edit_failure_stays_in_editing() {
        let mut store = MockDeckStore::new();
        store
            .expect_update_card()
            .times(1)
            .returning(|_, _| Err(TrailsError::conflict("duplicate question")));

        let review = loaded(store, MockReviewScheduler::new(), vec![card("1")]).await;
        assert!(review.edit("New Q", "New A").await.is_err());
        match review.state().await {
            ReviewState::Editing { draft, error, .. } => {
                assert_eq!(draft, CardDraft::new("New Q", "New A"));
                assert!(error.unwrap().contains("duplicate question"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!review.is_pending(&CardId::from("1")).await);
    }

    #[tokio::test]
    async fn test_edit_success_refetches_and_resets_position() {
        let mut store = MockDeckStore::new();
        store
            .expect_update_card()
            .withf(|id, draft| id.as_str() == "2" && draft.question == "Trimmed")
            .returning(|id, draft| Ok(Flashcard::new(id.clone(), "d1", draft.question.clone(), draft.answer.clone())));
        store
            .expect_list_cards()
            .times(1)
            .returning(|_| Ok(vec![card("2"), card("1")]));

        let review = loaded(store, MockReviewScheduler::new(), vec![card("1"), card("2")]).await;
        review.next().await;
        review.edit(" Trimmed ", "Answer").await.unwrap();
        assert_eq!(review.state().await, ReviewState::Viewing { position: 0 });
        assert_eq!(review.current_card().await.unwrap().id, CardId::from("2"));
    }

    #[tokio::test]
    async fn test_edit_saved_even_when_refetch_fails() {
        let mut store = MockDeckStore::new();
        store
            .expect_update_card()
            .times(1)
            .returning(|id, draft| Ok(Flashcard::new(id.clone(), "d1", draft.question.clone(), draft.answer.clone())));
        store
            .expect_list_cards()
            .times(1)
            .returning(|_| Err(TrailsError::network("connection reset")));

        let review = loaded(store, MockReviewScheduler::new(), vec![card("1"), card("2")]).await;
        let mut events = review.events().subscribe();
        review.next().await;

        review.edit("New", "Text").await.unwrap();
        assert_eq!(review.state().await, ReviewState::Viewing { position: 1 });
        let current = review.current_card().await.unwrap();
        assert_eq!(current.id, CardId::from("2"));
        assert_eq!(current.question, "New");
        assert_eq!(current.answer, "Text");
        assert!(events
            .drain()
            .iter()
            .any(|e| matches!(e, ReviewEvent::CardUpdated { .. })));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_card() {
        let mut store = MockDeckStore::new();
        store
            .expect_delete_card()
            .returning(|_| Err(TrailsError::network("timeout")));

        let review = loaded(store, MockReviewScheduler::new(), vec![card("1"), card("2")]).await;
        review.flip().await;
        assert!(review.delete().await.is_err());
        assert_eq!(review.state().await, ReviewState::Revealed { position: 0 });
        assert_eq!(review.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_actions_rejected_when_empty() {
        let review = loaded(MockDeckStore::new(), MockReviewScheduler::new(), Vec::new()).await;
        assert_eq!(review.flip().await, ReviewState::Empty);
        assert!(review.delete().await.is_err());
        assert!(review.edit("q", "a").await.is_err());
    }

    #[tokio::test]
    async fn test_switch_deck_makes_older_tickets_stale() {
        let review = CardReview::new(
            Arc::new(MockDeckStore::new()),
            Arc::new(MockReviewScheduler::new()),
        );
        let a = review.switch_deck(Some(DeckId::from("a"))).await.unwrap();
        let b = review.switch_deck(Some(DeckId::from("b"))).await.unwrap();

        assert!(!review.is_current(&a).await);
        assert_eq!(review.load_cards(b.clone(), vec![card("b1")]).await, FetchOutcome::Applied { count: 1 });
        assert_eq!(review.load_cards(a, vec![card("a1")]).await, FetchOutcome::Stale);
        // A result is applied at most once.
        assert_eq!(review.load_cards(b, vec![]).await, FetchOutcome::Stale);
        assert_eq!(review.current_card().await.unwrap().id, CardId::from("b1"));
    }

    #[tokio::test]
    async fn test_older_fetch_for_same_deck_never_overwrites_newer() {
        let review = CardReview::new(
            Arc::new(MockDeckStore::new()),
            Arc::new(MockReviewScheduler::new()),
        );
        review.switch_deck(Some(DeckId::from("a"))).await;
        let first = review.begin_fetch().await.unwrap();
        let second = review.begin_fetch().await.unwrap();

        review.load_cards(second, vec![card("new")]).await;
        assert_eq!(review.load_cards(first, vec![card("old")]).await, FetchOutcome::Stale);
        assert_eq!(review.current_card().await.unwrap().id, CardId::from("new"));
    }

    #[tokio::test]
    async fn test_begin_fetch_without_deck() {
        let review = CardReview::new(
            Arc::new(MockDeckStore::new()),
            Arc::new(MockReviewScheduler::new()),
        );
        assert!(review.begin_fetch().await.is_err());
    }
}
