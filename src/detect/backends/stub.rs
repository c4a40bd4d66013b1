use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::classify::{Classification, Classifier};
use crate::detect::result::{Detection, DetectionResult};
use crate::frame::{BoundingBox, Frame};

/// Scripted detector backend for tests and the synthetic demo.
///
/// Plays back a fixed per-frame script of detections; once the script is
/// exhausted every call returns an empty result (an empty scene, not an
/// error).
pub struct ScriptedBackend {
    script: VecDeque<Vec<Detection>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Empty scene forever.
    pub fn quiet() -> Self {
        Self::new(Vec::new())
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::ObjectDetection)
    }

    fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult> {
        let detections = self.script.pop_front().unwrap_or_default();
        Ok(DetectionResult { detections })
    }
}

/// Scripted classifier: plays back (label, confidence) pairs in call order.
///
/// Running past the end of the script is a test bug, so it fails loudly
/// instead of inventing a label.
pub struct ScriptedClassifier {
    script: VecDeque<(String, f32)>,
    calls: usize,
}

impl ScriptedClassifier {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self {
            script: script
                .into_iter()
                .map(|(label, confidence)| (label.into(), confidence))
                .collect(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Classifier for ScriptedClassifier {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn classify(&mut self, _frame: &Frame, _region: &BoundingBox) -> Result<Classification> {
        self.calls += 1;
        let (label, confidence) = self
            .script
            .pop_front()
            .ok_or_else(|| anyhow!("scripted classifier exhausted after {} calls", self.calls))?;
        Ok(Classification { label, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_backend_plays_back_then_goes_quiet() -> Result<()> {
        let det = Detection::new(BoundingBox::new(0, 0, 10, 10), 0.9, 17);
        let mut backend = ScriptedBackend::new(vec![vec![det], vec![]]);
        let frame = Frame::new(vec![0; 16], 4, 4, 0, 0);

        assert_eq!(backend.detect(&frame)?.detections.len(), 1);
        assert!(backend.detect(&frame)?.is_empty());
        // Exhausted script keeps returning empty scenes.
        assert!(backend.detect(&frame)?.is_empty());
        Ok(())
    }

    #[test]
    fn scripted_classifier_errors_when_exhausted() {
        let mut classifier = ScriptedClassifier::new([("tiger", 0.9f32)]);
        let frame = Frame::new(vec![0; 16], 4, 4, 0, 0);
        let region = BoundingBox::new(0, 0, 2, 2);

        assert!(classifier.classify(&frame, &region).is_ok());
        assert!(classifier.classify(&frame, &region).is_err());
    }
}
