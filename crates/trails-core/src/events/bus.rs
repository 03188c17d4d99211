//! Fan-out of review events to any number of listeners.
//!
//! Emitting never waits. A listener that falls more than the channel
//! capacity behind loses the oldest events and resumes with the newest.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::events::ReviewEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Shared handle for publishing [`ReviewEvent`]s. Clones publish to the same
/// listeners.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReviewEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Bus holding at most `capacity` unread events per listener.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Listen for events published from now on.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish `event`. With no listeners it is discarded.
    pub fn emit(&self, event: ReviewEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One listener's view of an [`EventBus`].
pub struct EventSubscriber {
    receiver: broadcast::Receiver<ReviewEvent>,
}

impl EventSubscriber {
    /// Wait for the next event, or `None` once every bus handle is gone.
    pub async fn recv(&mut self) -> Option<ReviewEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => break Some(event),
                Err(RecvError::Closed) => break None,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Review event listener fell behind");
                }
            }
        }
    }

    /// Next queued event, if one is ready.
    pub fn try_recv(&mut self) -> Option<ReviewEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<ReviewEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
