//! Seams to the remote authorities the client talks to.

mod deck_store;
mod review_scheduler;

pub use deck_store::*;
pub use review_scheduler::*;
