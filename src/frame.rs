//! Frames and bounding boxes.
//!
//! A `Frame` is one decoded image from the camera source, plus the capture
//! metadata the rest of the pipeline needs (frame index for decimation,
//! capture time for alert payloads). Pixels are packed grayscale; the core
//! never interprets them beyond handing crops to the classifier.

/// One decoded video frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic frame index assigned by the source.
    pub index: u64,
    /// Capture time, seconds since epoch.
    pub captured_at: u64,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64, captured_at: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            index,
            captured_at,
        }
    }

    /// Clamp a box to the frame bounds. Detector output may stick out past
    /// the frame edge; the classifier only ever sees the visible part.
    pub fn clamp(&self, bbox: &BoundingBox) -> BoundingBox {
        let w = self.width as i32;
        let h = self.height as i32;
        BoundingBox {
            x1: bbox.x1.clamp(0, w),
            y1: bbox.y1.clamp(0, h),
            x2: bbox.x2.clamp(0, w),
            y2: bbox.y2.clamp(0, h),
        }
    }
}

/// Axis-aligned box in pixel coordinates, (x1, y1) top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Degenerate boxes (zero width or height) must never reach the classifier.
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_boxes_are_empty() {
        assert!(BoundingBox::new(10, 10, 10, 40).is_empty());
        assert!(BoundingBox::new(10, 10, 40, 10).is_empty());
        // Inverted coordinates clamp to zero extent rather than negative area.
        assert!(BoundingBox::new(40, 40, 10, 10).is_empty());
        assert!(!BoundingBox::new(0, 0, 2, 2).is_empty());
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let frame = Frame::new(vec![0; 64 * 48], 64, 48, 0, 0);
        let clamped = frame.clamp(&BoundingBox::new(-5, 10, 100, 100));
        assert_eq!(clamped, BoundingBox::new(0, 10, 64, 48));
    }
}
