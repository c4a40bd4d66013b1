//! Per-tick control loop.
//!
//! One tick per frame: sampled ticks (frame index on the detection stride)
//! run detect -> triage -> buffer admission -> state machine -> dispatch ->
//! render; in-between ticks re-render the last known detections and leave
//! the temporal state untouched, so the absence threshold counts sampled
//! ticks. All session state (buffer, tracker, history, cooldowns) lives
//! here, owned by the single processing loop; nothing is ambient.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::alert::{AlertEvent, AlertSink, NotifierDispatch};
use crate::config::FieldwatchConfig;
use crate::detect::{
    triage_box, BoxRuling, Classifier, Detection, DetectorBackend, TriageSettings,
};
use crate::episode::{EpisodeTracker, EpisodeUpdate, SmoothingBuffer, Transition};
use crate::frame::Frame;
use crate::ingest::CameraSource;
use crate::render::{Annotation, AnnotationKind, EpisodeView, RenderSnapshot, Renderer};
use crate::AlertLog;

/// History entries handed to the display layer per tick.
const RECENT_ALERTS: usize = 5;

/// What one tick did, for tests and the demo summary.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Whether this tick ran detection (vs render-only).
    pub sampled: bool,
    /// Transition that fired, if any.
    pub transition: Option<Transition>,
    /// Whether the episode closed this tick.
    pub closed: bool,
    /// Whether external delivery was attempted.
    pub delivered: bool,
}

/// Counters accumulated by [`Pipeline::run`].
#[derive(Clone, Debug, Default)]
pub struct PipelineStats {
    pub frames_seen: u64,
    pub sampled_frames: u64,
    pub deliveries: u64,
}

/// The processing loop context: exclusively owns all session state
/// (smoothing buffer, episode tracker, history, cooldowns).
pub struct Pipeline {
    triage: TriageSettings,
    confirm_confidence: f32,
    display_confidence: f32,
    stride: u32,
    detector: Box<dyn DetectorBackend>,
    classifier: Box<dyn Classifier>,
    buffer: SmoothingBuffer,
    tracker: EpisodeTracker,
    history: AlertLog,
    dispatch: NotifierDispatch,
    renderer: Box<dyn Renderer>,
    /// Last sampled detections, reused for rendering between samples.
    last_detections: Vec<Detection>,
    last_annotations: Vec<Annotation>,
}

impl Pipeline {
    pub fn new(
        cfg: &FieldwatchConfig,
        detector: Box<dyn DetectorBackend>,
        classifier: Box<dyn Classifier>,
        sink: Box<dyn AlertSink>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            triage: TriageSettings {
                detect_confidence: cfg.detection.confidence,
                human_class_id: cfg.detection.human_class_id,
                human_confidence: cfg.detection.human_confidence,
            },
            confirm_confidence: cfg.classify.confirm_confidence,
            display_confidence: cfg.classify.display_confidence,
            stride: cfg.detection.stride,
            detector,
            classifier,
            buffer: SmoothingBuffer::new(cfg.smoothing.window, cfg.smoothing.min_agreement),
            tracker: EpisodeTracker::new(cfg.episode.absence_ticks, cfg.episode.change_policy),
            history: AlertLog::new(),
            dispatch: NotifierDispatch::new(cfg.alerts.sms_enabled, sink),
            renderer,
            last_detections: Vec::new(),
            last_annotations: Vec::new(),
        }
    }

    /// Process one frame. Never fails: transient detector or classifier
    /// errors are logged and the tick degrades to render-only, leaving the
    /// episode state untouched.
    pub fn tick(&mut self, frame: &Frame) -> TickReport {
        let mut report = TickReport::default();

        let sampled = frame.index % u64::from(self.stride) == 0;
        if !sampled {
            self.publish(frame);
            return report;
        }
        report.sampled = true;

        match self.detector.detect(frame) {
            Ok(result) => self.last_detections = result.detections,
            Err(e) => {
                // Transient failure: keep the previous detections for
                // display, but do not advance the temporal state off stale
                // votes.
                log::warn!("detector failed on frame {}: {}", frame.index, e);
                self.publish(frame);
                return report;
            }
        }

        let mut annotations = Vec::new();
        let mut admitted = false;
        for detection in &self.last_detections {
            let ruling = match triage_box(detection, frame, &self.triage, self.classifier.as_mut())
            {
                Ok(ruling) => ruling,
                Err(e) => {
                    log::warn!("classifier failed on frame {}: {}", frame.index, e);
                    continue;
                }
            };
            match ruling {
                BoxRuling::Human => {
                    if detection.confidence >= self.display_confidence {
                        annotations.push(Annotation {
                            bbox: detection.bbox,
                            label: "human".to_string(),
                            confidence: detection.confidence,
                            kind: AnnotationKind::Human,
                        });
                    }
                }
                BoxRuling::Animal(classification) => {
                    if detection.confidence >= self.display_confidence {
                        annotations.push(Annotation {
                            bbox: detection.bbox,
                            label: classification.label.clone(),
                            confidence: classification.confidence,
                            kind: AnnotationKind::Animal,
                        });
                    }
                    if classification.confidence > self.confirm_confidence {
                        self.buffer
                            .admit(&classification.label, classification.confidence);
                        admitted = true;
                    }
                }
                BoxRuling::Skipped => {}
            }
        }
        if !admitted {
            // Not a negative vote; the window slides so departed animals
            // age out instead of being pinned by stale votes.
            self.buffer.age();
        }
        self.last_annotations = annotations;

        let confirmed = self.buffer.confirmed();
        match self.tracker.observe(confirmed.as_ref(), frame.captured_at) {
            EpisodeUpdate::Opened(transition) => {
                self.history.record(&transition);
                report.delivered = self.dispatch.dispatch(&AlertEvent::from(&transition));
                report.transition = Some(transition);
            }
            EpisodeUpdate::Relabeled(transition) => {
                // The new label re-earns its window from scratch.
                self.buffer.clear();
                self.history.record(&transition);
                report.delivered = self.dispatch.dispatch(&AlertEvent::from(&transition));
                report.transition = Some(transition);
            }
            EpisodeUpdate::Closed { label, sequence } => {
                self.buffer.clear();
                log::info!("episode #{} closed: {} left", sequence, label);
                report.closed = true;
            }
            EpisodeUpdate::Ongoing | EpisodeUpdate::Idle => {}
        }

        self.publish(frame);
        report
    }

    /// Drive the loop until the stop flag is set or the source drains.
    /// The stop flag is checked once per tick, never preemptively.
    pub fn run(
        &mut self,
        source: &mut CameraSource,
        stop: &AtomicBool,
        pace: Duration,
    ) -> PipelineStats {
        let mut stats = PipelineStats::default();
        loop {
            if stop.load(Ordering::SeqCst) {
                log::info!("stop requested, ending run");
                break;
            }
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    // Normal termination, not an exception path.
                    log::info!("frame source drained, ending run");
                    break;
                }
                Err(e) => {
                    log::warn!("frame capture failed: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };
            let report = self.tick(&frame);
            stats.frames_seen += 1;
            if report.sampled {
                stats.sampled_frames += 1;
            }
            if report.delivered {
                stats.deliveries += 1;
            }
            if !pace.is_zero() {
                std::thread::sleep(pace);
            }
        }
        stats
    }

    fn publish(&mut self, frame: &Frame) {
        let snapshot = RenderSnapshot {
            frame_index: frame.index,
            annotations: self.last_annotations.clone(),
            episode: EpisodeView {
                active: self.tracker.is_active(),
                label: self.tracker.active_label().map(str::to_string),
                started_at: self.tracker.started_at(),
            },
            recent_alerts: self.history.recent(RECENT_ALERTS),
            total_episodes: self.tracker.sequence(),
        };
        self.renderer.render(&snapshot);
    }

    pub fn history(&self) -> &AlertLog {
        &self.history
    }

    pub fn episode_active(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn active_label(&self) -> Option<&str> {
        self.tracker.active_label()
    }

    /// Episodes ever opened.
    pub fn total_episodes(&self) -> u64 {
        self.tracker.sequence()
    }

    /// Re-arm external delivery for every label.
    pub fn reset_cooldowns(&mut self) {
        self.dispatch.reset_cooldowns();
    }
}
