//! Fieldwatch
//!
//! This crate implements the core of a wild-animal intrusion early-warning
//! pipeline: a live video feed is scanned for animals, per-frame
//! classifications are smoothed over time, and a human-facing alert is
//! raised exactly once per sustained intrusion episode, then cleared once
//! the animal leaves.
//!
//! # Architecture
//!
//! Control flow per sampled frame:
//!
//! frame source -> detector -> (per box) triage + classifier -> smoothing
//! buffer -> episode state machine -> notifier dispatch -> render snapshot
//!
//! The detector and classifier are external collaborators behind traits;
//! the core consumes `(box, confidence, label)` tuples and owns only the
//! temporal logic:
//!
//! 1. **Debounce**: a label confirms only with a strict plurality of M in
//!    the last N admitted votes.
//! 2. **Episode lifecycle**: INACTIVE/ACTIVE with absence counting; one
//!    notification per episode open or animal change, closes are silent.
//! 3. **Alerting never stalls perception**: external delivery is
//!    fire-and-forget behind a bounded queue; failures are logged, dropped,
//!    and invisible to the frame loop.
//!
//! # Module Structure
//!
//! - `ingest`: frame sources
//! - `detect`: detector/classifier traits and per-box triage
//! - `episode`: smoothing buffer and episode state machine
//! - `alert`: dispatch policy, transports, background worker
//! - `render`: read-only snapshots for a display layer
//! - `pipeline`: the per-tick control loop

use anyhow::{anyhow, Result};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod alert;
pub mod config;
pub mod detect;
pub mod episode;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod render;

pub use alert::{
    AlertEvent, AlertSink, AlertTransport, AlertWorker, InlineSink, LogAlertTransport,
    LogSoundTransport, NoopAlertTransport, NotifierDispatch, SoundTransport,
};
#[cfg(feature = "alert-http")]
pub use alert::HttpSmsTransport;
pub use config::FieldwatchConfig;
pub use detect::{
    triage_box, BoxRuling, Classification, Classifier, Detection, DetectionCapability,
    DetectionResult, DetectorBackend, ScriptedBackend, ScriptedClassifier, TriageSettings,
};
pub use episode::{
    ChangePolicy, Confirmation, EpisodeTracker, EpisodeUpdate, SmoothingBuffer, Transition,
    TransitionReason,
};
pub use frame::{BoundingBox, Frame};
pub use ingest::{CameraConfig, CameraSource, CameraStats};
pub use pipeline::{Pipeline, PipelineStats, TickReport};
pub use render::{
    Annotation, AnnotationKind, EpisodeView, LogRenderer, NullRenderer, RenderSnapshot, Renderer,
};

/// Seconds since the Unix epoch.
pub fn now_s() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

// -------------------- Alert History --------------------

/// One row of the alert history, produced on every episode open or animal
/// change. Append-only; read by the display layer as a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertLogEntry {
    pub sequence: u64,
    pub label: String,
    /// Seconds since epoch.
    pub at: u64,
}

/// In-memory, process-lifetime alert history. Single writer (the pipeline);
/// readers get cloned snapshots via [`AlertLog::recent`].
#[derive(Debug, Default)]
pub struct AlertLog {
    entries: Vec<AlertLogEntry>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, transition: &Transition) {
        self.entries.push(AlertLogEntry {
            sequence: transition.sequence,
            label: transition.label.clone(),
            at: transition.at,
        });
    }

    /// The most recent `k` entries, oldest first.
    pub fn recent(&self, k: usize) -> Vec<AlertLogEntry> {
        let start = self.entries.len().saturating_sub(k);
        self.entries[start..].to_vec()
    }

    pub fn entries(&self) -> &[AlertLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -------------------- Destination Discipline --------------------

/// A conforming SMS destination MUST be E.164: a leading `+` and 7 to 15
/// digits. A positive allowlist keeps gateway-specific formats out of the
/// config surface.
pub fn validate_destination(destination: &str) -> Result<()> {
    // Compile once for hot paths.
    static DESTINATION_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = DESTINATION_RE.get_or_init(|| regex::Regex::new(r"^\+[0-9]{7,15}$").unwrap());

    if !re.is_match(destination.trim()) {
        return Err(anyhow!(
            "sms destination must match ^\\+[0-9]{{7,15}}$ (E.164)"
        ));
    }
    Ok(())
}
