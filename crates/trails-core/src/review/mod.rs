//! Card review state machine.
//!
//! [`ReviewSession`] is the synchronous core: a snapshot of a deck's cards and
//! the [`ReviewState`] over them. [`CardReview`] wraps it with the network
//! calls, the animation delay and the stale-response guard.

mod controller;
mod session;
mod state;

pub use controller::{CardReview, FetchOutcome, FetchTicket};
pub use session::ReviewSession;
pub use state::{ReviewState, Transition};
