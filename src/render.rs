//! Read-only render snapshots.
//!
//! Once per tick the pipeline publishes a snapshot of everything a display
//! layer needs: annotated boxes for the current frame, episode state, the
//! most recent alert history, and the running episode total. The core never
//! blocks waiting on the consumer; `render` takes a borrowed snapshot and
//! returns nothing.

use crate::frame::BoundingBox;
use crate::AlertLogEntry;

/// What kind of box an annotation describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationKind {
    Human,
    Animal,
}

/// One labelled box to draw over the current frame.
#[derive(Clone, Debug)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
    pub kind: AnnotationKind,
}

/// Episode state as the display layer sees it.
#[derive(Clone, Debug, Default)]
pub struct EpisodeView {
    pub active: bool,
    pub label: Option<String>,
    pub started_at: Option<u64>,
}

/// Per-tick snapshot consumed by the display layer.
#[derive(Clone, Debug)]
pub struct RenderSnapshot {
    pub frame_index: u64,
    pub annotations: Vec<Annotation>,
    pub episode: EpisodeView,
    /// Most recent alert history entries, oldest first.
    pub recent_alerts: Vec<AlertLogEntry>,
    /// Episodes ever opened.
    pub total_episodes: u64,
}

/// Display layer contract. Implementations must return promptly; anything
/// slow belongs on the consumer's own thread.
pub trait Renderer: Send {
    fn render(&mut self, snapshot: &RenderSnapshot);
}

/// Renders to the debug log. The daemon default.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, snapshot: &RenderSnapshot) {
        log::debug!(
            "frame {}: {} boxes, episode active={} label={:?} total={}",
            snapshot.frame_index,
            snapshot.annotations.len(),
            snapshot.episode.active,
            snapshot.episode.label,
            snapshot.total_episodes
        );
    }
}

/// Discards snapshots.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &RenderSnapshot) {}
}
