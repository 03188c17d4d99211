//! Review states.

use serde::{Deserialize, Serialize};

use crate::types::CardDraft;

/// What a pending animation will do once it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Toggle the answer side.
    Flip,
    /// Move to another card, hiding the answer.
    Advance { to: usize },
}

/// State of the card under review.
///
/// Each variant carries exactly the data that is meaningful in it, so a
/// position without cards or a revealed answer without a card cannot be
/// expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewState {
    /// No cards loaded.
    Empty,
    /// Question side of the card at `position`.
    Viewing { position: usize },
    /// Answer side of the card at `position`.
    Revealed { position: usize },
    /// Non-interactive animation; `ticket` identifies it so a late completion
    /// cannot settle a newer transition.
    Transitioning {
        position: usize,
        revealed: bool,
        transition: Transition,
        ticket: u64,
    },
    /// Editing overlay for the card at `position`, over Viewing or Revealed.
    Editing {
        position: usize,
        revealed: bool,
        draft: CardDraft,
        /// Inline message from the last failed save.
        error: Option<String>,
    },
}

impl ReviewState {
    /// Index of the current card, if there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Viewing { position }
            | Self::Revealed { position }
            | Self::Transitioning { position, .. }
            | Self::Editing { position, .. } => Some(*position),
        }
    }

    /// Whether the answer side is showing.
    pub fn is_revealed(&self) -> bool {
        match self {
            Self::Empty | Self::Viewing { .. } => false,
            Self::Revealed { .. } => true,
            Self::Transitioning { revealed, .. } | Self::Editing { revealed, .. } => *revealed,
        }
    }

    /// Whether flip and navigation are accepted.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Viewing { .. } | Self::Revealed { .. })
    }

    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Viewing { .. } => "viewing",
            Self::Revealed { .. } => "revealed",
            Self::Transitioning { .. } => "transitioning",
            Self::Editing { .. } => "editing",
        }
    }

    /// The settled state at `position` with the given side showing.
    pub(crate) fn settled(position: usize, revealed: bool) -> Self {
        if revealed {
            Self::Revealed { position }
        } else {
            Self::Viewing { position }
        }
    }
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::Empty
    }
}
