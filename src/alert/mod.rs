//! Notifier dispatch: the thin policy layer between episode transitions and
//! the outside world.
//!
//! Every transition is logged unconditionally (that is the history feed the
//! dashboard reads); external delivery (SMS + sound) is additionally gated
//! by an enable flag and a per-label cooldown so a species that keeps
//! re-entering does not cause alert fatigue. The cooldown set is cleared
//! only by an explicit reset, never automatically.

mod transport;
mod worker;

use std::collections::HashSet;

use crate::episode::{Transition, TransitionReason};

pub use transport::{
    format_alert_message, AlertTransport, LogAlertTransport, LogSoundTransport, NoopAlertTransport,
    SoundTransport,
};
#[cfg(feature = "alert-http")]
pub use transport::HttpSmsTransport;
pub use worker::{AlertSink, AlertWorker, InlineSink};

/// Payload handed to sinks. Captured by value from the transition so
/// background delivery never reads live episode state.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertEvent {
    pub reason: TransitionReason,
    pub label: String,
    pub confidence: f32,
    pub sequence: u64,
    /// Seconds since epoch.
    pub at: u64,
}

impl From<&Transition> for AlertEvent {
    fn from(transition: &Transition) -> Self {
        Self {
            reason: transition.reason,
            label: transition.label.clone(),
            confidence: transition.confidence,
            sequence: transition.sequence,
            at: transition.at,
        }
    }
}

/// Decides, per transition, whether external delivery happens.
pub struct NotifierDispatch {
    external_enabled: bool,
    notified: HashSet<String>,
    sink: Box<dyn AlertSink>,
}

impl NotifierDispatch {
    pub fn new(external_enabled: bool, sink: Box<dyn AlertSink>) -> Self {
        Self {
            external_enabled,
            notified: HashSet::new(),
            sink,
        }
    }

    /// Handle one transition event.
    ///
    /// Logging happens for every event; delivery at most once per label per
    /// process run. Returns whether delivery was attempted (for tests and
    /// the tick report).
    pub fn dispatch(&mut self, event: &AlertEvent) -> bool {
        log::info!(
            "episode event #{}: {} label={} conf={:.2} at={}",
            event.sequence,
            event.reason.as_str(),
            event.label,
            event.confidence,
            event.at
        );

        if !self.external_enabled {
            return false;
        }
        if !self.notified.insert(event.label.clone()) {
            log::debug!("alert for {} suppressed by cooldown", event.label);
            return false;
        }
        self.sink.submit(event.clone());
        true
    }

    /// Forget every notified label, re-arming delivery for all of them.
    pub fn reset_cooldowns(&mut self) {
        self.notified.clear();
    }

    /// Labels currently held by the cooldown.
    pub fn notified_labels(&self) -> impl Iterator<Item = &str> {
        self.notified.iter().map(String::as_str)
    }
}
