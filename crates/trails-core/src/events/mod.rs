//! Review lifecycle events.
//!
//! This module provides:
//! - Event types for deck selection, navigation and card mutations
//! - An event bus for UI subscribers

mod bus;
mod event;

pub use bus::{EventBus, EventSubscriber};
pub use event::ReviewEvent;
