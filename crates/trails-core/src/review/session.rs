//! Synchronous review session: a card snapshot and the state over it.
//!
//! Transitions are split in two halves. `begin_*` moves into
//! [`ReviewState::Transitioning`] and hands back a ticket; `finish_transition`
//! settles it. The instant helpers [`ReviewSession::flip`],
//! [`ReviewSession::next`] and [`ReviewSession::previous`] do both at once.

use crate::error::{TrailsError, TrailsResult};
use crate::types::{CardDraft, CardId, Flashcard};

use super::state::{ReviewState, Transition};

/// Ordered snapshot of a deck's cards plus the review state over it.
///
/// Invariant: the state carries a position exactly when `cards` is non-empty,
/// and that position is always in `0..cards.len()`.
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    cards: Vec<Flashcard>,
    state: ReviewState,
    next_ticket: u64,
}

impl ReviewSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session already loaded with `cards`.
    pub fn with_cards(cards: Vec<Flashcard>) -> Self {
        let mut session = Self::new();
        session.load_cards(cards);
        session
    }

    /// Replace the snapshot. Lands in `Viewing` at 0, or `Empty`.
    ///
    /// Any pending transition is abandoned.
    pub fn load_cards(&mut self, cards: Vec<Flashcard>) {
        self.state = if cards.is_empty() {
            ReviewState::Empty
        } else {
            ReviewState::Viewing { position: 0 }
        };
        self.cards = cards;
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self) -> Option<usize> {
        self.state.position()
    }

    pub fn is_revealed(&self) -> bool {
        self.state.is_revealed()
    }

    /// The card under review.
    pub fn current_card(&self) -> Option<&Flashcard> {
        self.position().and_then(|p| self.cards.get(p))
    }

    /// Start a flip. Returns the transition ticket, or `None` when ignored.
    pub fn begin_flip(&mut self) -> Option<u64> {
        let (position, revealed) = match self.state {
            ReviewState::Viewing { position } => (position, false),
            ReviewState::Revealed { position } => (position, true),
            _ => return None,
        };
        Some(self.enter_transition(position, revealed, Transition::Flip))
    }

    /// Start moving to the next card, wrapping at the end.
    pub fn begin_next(&mut self) -> Option<u64> {
        self.begin_advance(|position, len| (position + 1) % len)
    }

    /// Start moving to the previous card, wrapping at the start.
    pub fn begin_previous(&mut self) -> Option<u64> {
        self.begin_advance(|position, len| (position + len - 1) % len)
    }

    fn begin_advance(&mut self, step: impl Fn(usize, usize) -> usize) -> Option<u64> {
        let len = self.cards.len();
        let (position, revealed) = match self.state {
            ReviewState::Viewing { position } => (position, false),
            ReviewState::Revealed { position } => (position, true),
            _ => return None,
        };
        if len == 0 {
            return None;
        }
        let to = step(position, len);
        Some(self.enter_transition(position, revealed, Transition::Advance { to }))
    }

    fn enter_transition(&mut self, position: usize, revealed: bool, transition: Transition) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.state = ReviewState::Transitioning {
            position,
            revealed,
            transition,
            ticket,
        };
        ticket
    }

    /// Settle the transition identified by `ticket`.
    ///
    /// Returns `false` when the session has moved on since (reload, deck
    /// change, or a different transition), in which case nothing changes.
    pub fn finish_transition(&mut self, ticket: u64) -> bool {
        let next = match &self.state {
            ReviewState::Transitioning {
                position,
                revealed,
                transition,
                ticket: current,
            } if *current == ticket => match transition {
                Transition::Flip => ReviewState::settled(*position, !revealed),
                Transition::Advance { to } => ReviewState::Viewing { position: *to },
            },
            _ => return false,
        };
        self.state = next;
        true
    }

    /// Flip without animation.
    pub fn flip(&mut self) -> bool {
        self.begin_flip().map(|t| self.finish_transition(t)).unwrap_or(false)
    }

    /// Move to the next card without animation.
    pub fn next(&mut self) -> bool {
        self.begin_next().map(|t| self.finish_transition(t)).unwrap_or(false)
    }

    /// Move to the previous card without animation.
    pub fn previous(&mut self) -> bool {
        self.begin_previous().map(|t| self.finish_transition(t)).unwrap_or(false)
    }

    /// Open the editing overlay on the current card, prefilled with its text.
    pub fn begin_edit(&mut self) -> TrailsResult<()> {
        match self.state {
            ReviewState::Viewing { position } | ReviewState::Revealed { position } => {
                let revealed = self.state.is_revealed();
                let draft = self.cards[position].draft();
                self.state = ReviewState::Editing {
                    position,
                    revealed,
                    draft,
                    error: None,
                };
                Ok(())
            }
            ReviewState::Editing { .. } => Ok(()),
            ref other => Err(TrailsError::invalid_state(format!(
                "Cannot edit while {}",
                other.name()
            ))),
        }
    }

    /// Replace the draft held by the editing overlay.
    pub fn set_draft(&mut self, new_draft: CardDraft) -> TrailsResult<()> {
        match &mut self.state {
            ReviewState::Editing { draft, .. } => {
                *draft = new_draft;
                Ok(())
            }
            other => Err(TrailsError::invalid_state(format!(
                "No card is being edited ({})",
                other.name()
            ))),
        }
    }

    /// Show `message` inline next to the editing form.
    pub fn set_edit_error(&mut self, message: impl Into<String>) {
        if let ReviewState::Editing { error, .. } = &mut self.state {
            *error = Some(message.into());
        }
    }

    /// Close the editing overlay, returning to the side that was showing.
    pub fn cancel_edit(&mut self) -> bool {
        match self.state {
            ReviewState::Editing {
                position, revealed, ..
            } => {
                self.state = ReviewState::settled(position, revealed);
                true
            }
            _ => false,
        }
    }

    /// Swap in the server's copy of a card, keeping its place and the state.
    pub fn replace_card(&mut self, card: Flashcard) -> bool {
        match self.cards.iter_mut().find(|c| c.id == card.id) {
            Some(slot) => {
                *slot = card;
                true
            }
            None => false,
        }
    }

    /// Remove a card from the snapshot after the server deleted it.
    ///
    /// The session lands in `Viewing` at `min(position, len - 1)`, or `Empty`
    /// when nothing is left. A card removed before the current one shifts the
    /// position down so the same card stays in view.
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<Flashcard> {
        let index = self.cards.iter().position(|c| &c.id == card_id)?;
        let removed = self.cards.remove(index);

        if self.cards.is_empty() {
            self.state = ReviewState::Empty;
            return Some(removed);
        }

        let mut position = self.position().unwrap_or(0);
        if index < position {
            position -= 1;
        }
        let position = position.min(self.cards.len() - 1);
        self.state = ReviewState::Viewing { position };
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard::new(i.to_string(), "d1", format!("Q{}", i), format!("A{}", i)))
            .collect()
    }

    #[test]
    fn test_load_cards() {
        let mut session = ReviewSession::new();
        assert_eq!(session.state(), &ReviewState::Empty);

        session.load_cards(cards(3));
        assert_eq!(session.state(), &ReviewState::Viewing { position: 0 });

        session.load_cards(Vec::new());
        assert_eq!(session.state(), &ReviewState::Empty);
        assert!(session.current_card().is_none());
    }

    #[test]
    fn test_flip_goes_through_transitioning() {
        let mut session = ReviewSession::with_cards(cards(2));
        let ticket = session.begin_flip().unwrap();
        assert!(matches!(
            session.state(),
            ReviewState::Transitioning {
                transition: Transition::Flip,
                revealed: false,
                ..
            }
        ));
        // No stacking while the animation runs.
        assert!(session.begin_flip().is_none());
        assert!(session.begin_next().is_none());

        assert!(session.finish_transition(ticket));
        assert_eq!(session.state(), &ReviewState::Revealed { position: 0 });

        assert!(session.flip());
        assert_eq!(session.state(), &ReviewState::Viewing { position: 0 });
    }

    #[test]
    fn test_flip_on_empty_is_noop() {
        let mut session = ReviewSession::new();
        assert!(!session.flip());
        assert!(!session.next());
        assert!(!session.previous());
        assert_eq!(session.state(), &ReviewState::Empty);
    }

    #[test]
    fn test_next_wraps_and_hides_answer() {
        let mut session = ReviewSession::with_cards(cards(3));
        session.flip();
        assert!(session.next());
        assert_eq!(session.state(), &ReviewState::Viewing { position: 1 });
        session.next();
        session.next();
        assert_eq!(session.position(), Some(0));
    }

    #[test]
    fn test_previous_wraps() {
        let mut session = ReviewSession::with_cards(cards(3));
        assert!(session.previous());
        assert_eq!(session.position(), Some(2));
    }

    #[test]
    fn test_single_card_navigation_resets_reveal() {
        let mut session = ReviewSession::with_cards(cards(1));
        session.flip();
        assert!(session.is_revealed());
        assert!(session.next());
        assert_eq!(session.state(), &ReviewState::Viewing { position: 0 });
        session.flip();
        assert!(session.previous());
        assert_eq!(session.state(), &ReviewState::Viewing { position: 0 });
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut session = ReviewSession::with_cards(cards(2));
        let old = session.begin_next().unwrap();
        session.load_cards(cards(2));
        let new = session.begin_flip().unwrap();

        assert!(!session.finish_transition(old));
        assert!(matches!(session.state(), ReviewState::Transitioning { .. }));
        assert!(session.finish_transition(new));
        assert_eq!(session.state(), &ReviewState::Revealed { position: 0 });
    }

    #[test]
    fn test_edit_overlay_round_trip() {
        let mut session = ReviewSession::with_cards(cards(2));
        session.flip();
        session.begin_edit().unwrap();
        match session.state() {
            ReviewState::Editing {
                position,
                revealed,
                draft,
                error,
            } => {
                assert_eq!(*position, 0);
                assert!(*revealed);
                assert_eq!(draft, &CardDraft::new("Q0", "A0"));
                assert!(error.is_none());
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!session.flip());

        session.set_edit_error("boom");
        assert!(matches!(
            session.state(),
            ReviewState::Editing { error: Some(_), .. }
        ));

        assert!(session.cancel_edit());
        assert_eq!(session.state(), &ReviewState::Revealed { position: 0 });
    }

    #[test]
    fn test_begin_edit_rejected_when_empty_or_animating() {
        let mut session = ReviewSession::new();
        assert!(session.begin_edit().is_err());

        session.load_cards(cards(1));
        session.begin_flip();
        assert!(session.begin_edit().is_err());
        assert!(session.set_draft(CardDraft::default()).is_err());
    }

    #[test]
    fn test_remove_only_card_empties_session() {
        let mut session = ReviewSession::with_cards(cards(1));
        assert!(session.remove_card(&CardId::from("0")).is_some());
        assert_eq!(session.state(), &ReviewState::Empty);
    }

    #[test]
    fn test_remove_current_card_keeps_or_clamps_position() {
        let mut session = ReviewSession::with_cards(cards(3));
        session.next();
        session.flip();
        session.remove_card(&CardId::from("1"));
        assert_eq!(session.state(), &ReviewState::Viewing { position: 1 });
        assert_eq!(session.current_card().unwrap().question, "Q2");

        session.remove_card(&CardId::from("2"));
        assert_eq!(session.state(), &ReviewState::Viewing { position: 0 });
    }

    #[test]
    fn test_remove_earlier_card_keeps_same_card_in_view() {
        let mut session = ReviewSession::with_cards(cards(3));
        session.next();
        session.next();
        session.remove_card(&CardId::from("0"));
        assert_eq!(session.current_card().unwrap().question, "Q2");
        assert_eq!(session.position(), Some(1));
    }

    #[test]
    fn test_remove_unknown_card_is_noop() {
        let mut session = ReviewSession::with_cards(cards(2));
        session.flip();
        assert!(session.remove_card(&CardId::from("nope")).is_none());
        assert_eq!(session.state(), &ReviewState::Revealed { position: 0 });
    }

    #[test]
    fn test_replace_card_keeps_position_and_side() {
        let mut session = ReviewSession::with_cards(cards(3));
        session.next();
        session.flip();

        let updated = Flashcard::new("1", "d1", "New", "Text");
        assert!(session.replace_card(updated));
        assert_eq!(session.state(), &ReviewState::Revealed { position: 1 });
        assert_eq!(session.current_card().unwrap().question, "New");
        assert!(!session.replace_card(Flashcard::new("9", "d1", "Q", "A")));
    }
}
