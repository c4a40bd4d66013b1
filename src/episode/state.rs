//! Episode lifecycle state machine.
//!
//! Owns "is an intrusion currently active", which animal is active, and how
//! long the scene has been empty. One `observe` call per sampled frame turns
//! the smoothing buffer's confirmation into episode transitions with
//! at-most-one-notification-per-episode semantics: notifications only ever
//! accompany an episode opening or an animal change, never a close and never
//! a frame that merely sustains the current episode.

use serde::Deserialize;

use crate::episode::buffer::Confirmation;

/// Why a transition fired. Closes are silent, so there is no close reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionReason {
    EpisodeStart,
    AnimalChanged,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::EpisodeStart => "episode-start",
            TransitionReason::AnimalChanged => "animal-changed",
        }
    }
}

/// A notifiable transition: the payload later handed to dispatch and the
/// alert log. Captured by value so background delivery never has to read
/// episode state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub reason: TransitionReason,
    pub label: String,
    pub confidence: f32,
    /// Monotonic count of episodes ever opened.
    pub sequence: u64,
    /// Seconds since epoch.
    pub at: u64,
}

/// What happened during one observed tick.
#[derive(Clone, Debug, PartialEq)]
pub enum EpisodeUpdate {
    /// INACTIVE -> ACTIVE. Notify, log, render.
    Opened(Transition),
    /// Still ACTIVE but the confirmed animal changed. The caller must clear
    /// the smoothing buffer so the new label re-earns its window.
    Relabeled(Transition),
    /// Absence persisted past the threshold; episode closed silently.
    /// The caller must clear the smoothing buffer.
    Closed { label: String, sequence: u64 },
    /// ACTIVE and nothing notable (same animal, or absence still counting).
    Ongoing,
    /// INACTIVE and nothing confirmed.
    Idle,
}

/// Policy for a changed confirmed label mid-episode.
///
/// Source deployments disagree on whether a corrected identification extends
/// the ongoing visit or starts a fresh episode, so it is configuration, not
/// a hard-coded choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangePolicy {
    /// One continuous presence with a corrected identification: the episode
    /// keeps its start time and the transition reads "animal-changed".
    #[default]
    Extend,
    /// The change opens a brand-new episode: start time resets and the
    /// transition reads "episode-start".
    NewEpisode,
}

/// Episode state machine. Single-owner, mutated once per sampled frame,
/// lives for the process lifetime (reset to inactive, never destroyed).
#[derive(Debug)]
pub struct EpisodeTracker {
    active_label: Option<String>,
    absence_ticks: u32,
    /// Consecutive non-confirming ticks that close an active episode.
    absence_limit: u32,
    sequence: u64,
    started_at: Option<u64>,
    change_policy: ChangePolicy,
}

impl EpisodeTracker {
    pub fn new(absence_limit: u32, change_policy: ChangePolicy) -> Self {
        Self {
            active_label: None,
            absence_ticks: 0,
            absence_limit,
            sequence: 0,
            started_at: None,
            change_policy,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_label.is_some()
    }

    pub fn active_label(&self) -> Option<&str> {
        self.active_label.as_deref()
    }

    /// Episodes ever opened.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    /// Advance the machine by one sampled tick.
    ///
    /// `confirmed` is the smoothing buffer's current winner (None when the
    /// window has no strict-plurality winner, including the empty-scene
    /// case: a frame with no admissions is not a negative vote, the window
    /// just ages).
    pub fn observe(&mut self, confirmed: Option<&Confirmation>, now: u64) -> EpisodeUpdate {
        match (&self.active_label, confirmed) {
            (None, Some(confirmation)) => {
                self.active_label = Some(confirmation.label.clone());
                self.absence_ticks = 0;
                self.sequence += 1;
                self.started_at = Some(now);
                EpisodeUpdate::Opened(Transition {
                    reason: TransitionReason::EpisodeStart,
                    label: confirmation.label.clone(),
                    confidence: confirmation.confidence,
                    sequence: self.sequence,
                    at: now,
                })
            }
            (Some(active), Some(confirmation)) if *active == confirmation.label => {
                // Same animal persists: idempotent, nothing re-fires.
                self.absence_ticks = 0;
                EpisodeUpdate::Ongoing
            }
            (Some(_), Some(confirmation)) => {
                self.active_label = Some(confirmation.label.clone());
                self.absence_ticks = 0;
                self.sequence += 1;
                let reason = match self.change_policy {
                    ChangePolicy::Extend => TransitionReason::AnimalChanged,
                    ChangePolicy::NewEpisode => {
                        self.started_at = Some(now);
                        TransitionReason::EpisodeStart
                    }
                };
                EpisodeUpdate::Relabeled(Transition {
                    reason,
                    label: confirmation.label.clone(),
                    confidence: confirmation.confidence,
                    sequence: self.sequence,
                    at: now,
                })
            }
            (Some(_), None) => {
                self.absence_ticks += 1;
                if self.absence_ticks >= self.absence_limit {
                    let label = self.active_label.take().unwrap_or_default();
                    self.absence_ticks = 0;
                    self.started_at = None;
                    EpisodeUpdate::Closed {
                        label,
                        sequence: self.sequence,
                    }
                } else {
                    EpisodeUpdate::Ongoing
                }
            }
            (None, None) => EpisodeUpdate::Idle,
        }
    }
}
