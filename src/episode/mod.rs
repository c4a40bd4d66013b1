//! Temporal confirmation and episode lifecycle.
//!
//! The smoothing buffer turns noisy per-frame labels into a debounced
//! confirmation; the tracker turns confirmations into episode open/change/
//! close transitions with at-most-once notification semantics.

mod buffer;
mod state;

pub use buffer::{Confirmation, SmoothingBuffer};
pub use state::{ChangePolicy, EpisodeTracker, EpisodeUpdate, Transition, TransitionReason};
