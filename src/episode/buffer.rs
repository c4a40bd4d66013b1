//! Rolling label window for temporal confirmation.
//!
//! Single-frame detector noise (misclassification, occlusion) must not
//! trigger an alert, so a label only counts as confirmed once it wins a
//! strict plurality of the votes in the last N window slots with at least
//! M of them. The cost is a few frames of latency on onset; the payoff is
//! false-positive suppression.
//!
//! A sampled frame with nothing to admit pushes an *empty* slot instead:
//! not a negative vote, but it occupies window capacity, so support for a
//! departed animal ages out naturally instead of being pinned forever.

use std::collections::{HashMap, VecDeque};

/// A confirmed label with the strongest classifier confidence seen for it
/// in the current window.
#[derive(Clone, Debug, PartialEq)]
pub struct Confirmation {
    pub label: String,
    pub confidence: f32,
}

#[derive(Clone, Debug)]
struct Vote {
    label: String,
    confidence: f32,
}

/// Fixed-capacity FIFO window of recent frame slots.
///
/// Invariants: `len() <= capacity`; only classifications that already passed
/// the confirmation threshold are admitted (the pipeline enforces the
/// threshold, the buffer just counts votes).
#[derive(Debug)]
pub struct SmoothingBuffer {
    slots: VecDeque<Option<Vote>>,
    capacity: usize,
    min_stable: usize,
}

impl SmoothingBuffer {
    /// `capacity` is the window size N, `min_stable` the minimum count M.
    /// Config validation guarantees 1 <= M <= N before this is constructed.
    pub fn new(capacity: usize, min_stable: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
            min_stable,
        }
    }

    /// Append a vote, evicting the oldest slot when at capacity.
    pub fn admit(&mut self, label: &str, confidence: f32) {
        self.push(Some(Vote {
            label: label.to_string(),
            confidence,
        }));
    }

    /// Append an empty slot for a sampled frame that admitted nothing.
    /// Support is not decremented, merely not incremented; old votes age
    /// out as the window slides.
    pub fn age(&mut self) {
        self.push(None);
    }

    fn push(&mut self, slot: Option<Vote>) {
        if self.slots.len() == self.capacity {
            self.slots.pop_front();
        }
        self.slots.push_back(slot);
    }

    /// The strict plurality winner of the current window, if any.
    ///
    /// Returns Some iff one label's vote count is the unique maximum and
    /// that count is >= M. A tie for the plurality confirms nothing;
    /// guessing between tied labels would make onset order-dependent.
    pub fn confirmed(&self) -> Option<Confirmation> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for vote in self.slots.iter().flatten() {
            *counts.entry(vote.label.as_str()).or_insert(0) += 1;
        }

        let (&leader, &leader_count) = counts.iter().max_by_key(|(_, count)| **count)?;
        if leader_count < self.min_stable {
            return None;
        }
        let tied = counts
            .values()
            .filter(|count| **count == leader_count)
            .count();
        if tied > 1 {
            return None;
        }

        let confidence = self
            .slots
            .iter()
            .flatten()
            .filter(|vote| vote.label == leader)
            .map(|vote| vote.confidence)
            .fold(0.0f32, f32::max);
        Some(Confirmation {
            label: leader.to_string(),
            confidence,
        })
    }

    /// Drop all slots. Invoked on episode close and on an animal change.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Occupied window slots (votes and empty slots alike).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buffer: &mut SmoothingBuffer, labels: &[&str]) {
        for label in labels {
            buffer.admit(label, 0.9);
        }
    }

    #[test]
    fn plurality_with_min_count_confirms() {
        let mut buffer = SmoothingBuffer::new(7, 4);
        fill(
            &mut buffer,
            &["tiger", "tiger", "tiger", "tiger", "deer", "deer", "deer"],
        );
        assert_eq!(buffer.confirmed().unwrap().label, "tiger");
    }

    #[test]
    fn nothing_reaches_min_count() {
        let mut buffer = SmoothingBuffer::new(7, 4);
        fill(
            &mut buffer,
            &["tiger", "tiger", "tiger", "deer", "deer", "deer", "boar"],
        );
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn tie_for_plurality_confirms_nothing() {
        // Both at the max count and above M: deterministic None, never a guess.
        let mut buffer = SmoothingBuffer::new(8, 3);
        fill(
            &mut buffer,
            &["tiger", "deer", "tiger", "deer", "tiger", "deer"],
        );
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn empty_buffer_confirms_nothing() {
        let buffer = SmoothingBuffer::new(5, 2);
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn eviction_ages_out_old_votes() {
        let mut buffer = SmoothingBuffer::new(3, 2);
        fill(&mut buffer, &["tiger", "tiger", "tiger"]);
        assert_eq!(buffer.confirmed().unwrap().label, "tiger");

        // Three deer votes push every tiger vote out of the window.
        fill(&mut buffer, &["deer", "deer", "deer"]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.confirmed().unwrap().label, "deer");
    }

    #[test]
    fn unique_max_below_min_count_confirms_nothing() {
        let mut buffer = SmoothingBuffer::new(7, 4);
        fill(&mut buffer, &["tiger", "tiger", "tiger"]);
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn single_empty_frame_does_not_break_confirmation() {
        let mut buffer = SmoothingBuffer::new(7, 4);
        fill(&mut buffer, &["tiger", "tiger", "tiger", "tiger", "tiger"]);
        buffer.age();
        // Support not incremented, but four tigers still stand.
        assert_eq!(buffer.confirmed().unwrap().label, "tiger");
    }

    #[test]
    fn sustained_absence_erodes_support() {
        let mut buffer = SmoothingBuffer::new(3, 2);
        fill(&mut buffer, &["tiger", "tiger", "tiger"]);
        buffer.age();
        assert_eq!(buffer.confirmed().unwrap().label, "tiger");
        buffer.age();
        // One tiger vote left in the window: below M.
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn clear_empties_window() {
        let mut buffer = SmoothingBuffer::new(5, 2);
        fill(&mut buffer, &["boar", "boar"]);
        assert_eq!(buffer.confirmed().unwrap().label, "boar");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.confirmed(), None);
    }

    #[test]
    fn confirmation_reports_strongest_confidence_for_winner() {
        let mut buffer = SmoothingBuffer::new(5, 2);
        buffer.admit("tiger", 0.71);
        buffer.admit("deer", 0.99);
        buffer.admit("tiger", 0.84);
        let confirmation = buffer.confirmed().unwrap();
        assert_eq!(confirmation.label, "tiger");
        assert!((confirmation.confidence - 0.84).abs() < f32::EPSILON);
    }
}
