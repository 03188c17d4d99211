//! Review ratings and scheduler results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::ids::CardId;

/// Self-reported recall difficulty for a revealed card.
///
/// Each rating maps to an SM-2 quality value on the 0-5 scale the scheduler
/// expects; qualities below 3 reset the card's repetition count.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Recalled with serious difficulty.
    Hard,
    /// Recalled after some hesitation.
    Good,
    /// Recalled effortlessly.
    Easy,
}

impl Rating {
    /// SM-2 quality value sent to the scheduler.
    pub fn quality(self) -> u8 {
        match self {
            Rating::Hard => 2,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }

    /// Inverse of [`Rating::quality`].
    pub fn from_quality(quality: u8) -> Option<Self> {
        match quality {
            2 => Some(Rating::Hard),
            4 => Some(Rating::Good),
            5 => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.quality()
    }
}

/// Body of a review submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub quality: u8,
}

impl From<Rating> for ReviewSubmission {
    fn from(rating: Rating) -> Self {
        Self {
            quality: rating.quality(),
        }
    }
}

/// Scheduling metadata returned after a review.
///
/// The client does not interpret these values beyond display; fields the
/// server adds later are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcard_id: Option<CardId>,
    /// When the card is next due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<String>,
    /// Interval in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ReviewProgress {
    /// Parse `next_review` as an ISO-8601 timestamp without offset.
    pub fn next_review_at(&self) -> Option<NaiveDateTime> {
        self.next_review.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}
