use crate::frame::BoundingBox;

/// Result of running detection on one frame.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    /// Candidate boxes, unordered.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// One candidate object in a frame. Frame-scoped; discarded once the tick
/// that produced it completes (render may hold on to a copy for decimated
/// frames in between detection samples).
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Detector confidence, 0..=1.
    pub confidence: f32,
    /// Raw detector class id. Class 0 is conventionally "person" for
    /// COCO-trained detectors; the triage layer maps it via config.
    pub class_id: u32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32, class_id: u32) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}
