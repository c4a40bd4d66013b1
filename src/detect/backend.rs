use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detection capabilities supported by backends.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    ObjectDetection,
    Classification,
}

/// Detector backend trait.
///
/// Implementations are black boxes to the core: the pipeline only consumes
/// `(box, confidence, class_id)` tuples. Backends must treat the frame as
/// read-only and ephemeral, and must not block the tick on network I/O.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
