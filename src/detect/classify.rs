//! Per-box triage: decide what a detected box means before it can vote.
//!
//! The detector proposes boxes; triage applies the ordered gates from the
//! decision policy (detection threshold, human exclusion, degenerate crops)
//! and only then consults the classifier. Rendering decisions are made
//! elsewhere; this module is side-effect free apart from the classifier call.

use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::{BoundingBox, Frame};

/// Refined label for a cropped region, as returned by the classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Classifier confidence, 0..=1.
    pub confidence: f32,
}

/// Classifier trait: names a cropped region of a frame.
///
/// Called once per non-human box per sampled frame. Implementations must
/// never be handed a zero-area crop; triage filters those out first.
pub trait Classifier: Send {
    fn name(&self) -> &'static str;

    fn classify(&mut self, frame: &Frame, region: &BoundingBox) -> Result<Classification>;
}

/// Outcome of triaging one detection.
#[derive(Clone, Debug, PartialEq)]
pub enum BoxRuling {
    /// Person above the human-exclusion threshold; annotated but never
    /// classified and never admitted to the smoothing buffer.
    Human,
    /// Classified animal candidate.
    Animal(Classification),
    /// Below the detection threshold, degenerate crop, or otherwise ignored.
    Skipped,
}

/// Gates applied to each box before classification, in order.
#[derive(Clone, Copy, Debug)]
pub struct TriageSettings {
    /// Minimum detector confidence for a box to be classified at all.
    pub detect_confidence: f32,
    /// Detector class id treated as "person".
    pub human_class_id: u32,
    /// Minimum detector confidence for the human exclusion to apply.
    pub human_confidence: f32,
}

/// Triage one detection against a frame.
///
/// Gate order matters: the detection threshold gates which boxes are
/// classified at all; human exclusion comes next so a confident person box
/// is never sent to the animal classifier; empty crops are skipped with no
/// classifier call.
pub fn triage_box(
    detection: &Detection,
    frame: &Frame,
    settings: &TriageSettings,
    classifier: &mut dyn Classifier,
) -> Result<BoxRuling> {
    if detection.confidence < settings.detect_confidence {
        return Ok(BoxRuling::Skipped);
    }

    if detection.class_id == settings.human_class_id
        && detection.confidence > settings.human_confidence
    {
        return Ok(BoxRuling::Human);
    }

    let crop = frame.clamp(&detection.bbox);
    if crop.is_empty() {
        return Ok(BoxRuling::Skipped);
    }

    let classification = classifier.classify(frame, &crop)?;
    Ok(BoxRuling::Animal(classification))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always returns the same label; counts invocations.
    struct FixedClassifier {
        label: &'static str,
        calls: usize,
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn classify(&mut self, _frame: &Frame, _region: &BoundingBox) -> Result<Classification> {
            self.calls += 1;
            Ok(Classification {
                label: self.label.to_string(),
                confidence: 0.9,
            })
        }
    }

    fn settings() -> TriageSettings {
        TriageSettings {
            detect_confidence: 0.5,
            human_class_id: 0,
            human_confidence: 0.6,
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 64 * 48], 64, 48, 0, 0)
    }

    #[test]
    fn low_confidence_boxes_are_not_classified() -> Result<()> {
        let mut classifier = FixedClassifier {
            label: "tiger",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(0, 0, 10, 10), 0.3, 17);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert_eq!(ruling, BoxRuling::Skipped);
        assert_eq!(classifier.calls, 0);
        Ok(())
    }

    #[test]
    fn confident_person_skips_classifier() -> Result<()> {
        let mut classifier = FixedClassifier {
            label: "tiger",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(0, 0, 10, 10), 0.8, 0);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert_eq!(ruling, BoxRuling::Human);
        assert_eq!(classifier.calls, 0);
        Ok(())
    }

    #[test]
    fn uncertain_person_still_reaches_classifier() -> Result<()> {
        // Class id says person but below the human-exclusion threshold:
        // falls through to classification like any other box.
        let mut classifier = FixedClassifier {
            label: "boar",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(0, 0, 10, 10), 0.55, 0);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert!(matches!(ruling, BoxRuling::Animal(_)));
        assert_eq!(classifier.calls, 1);
        Ok(())
    }

    #[test]
    fn zero_area_crop_is_skipped_silently() -> Result<()> {
        let mut classifier = FixedClassifier {
            label: "tiger",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(20, 20, 20, 40), 0.9, 17);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert_eq!(ruling, BoxRuling::Skipped);
        assert_eq!(classifier.calls, 0);
        Ok(())
    }

    #[test]
    fn offscreen_box_clamps_to_empty_and_is_skipped() -> Result<()> {
        let mut classifier = FixedClassifier {
            label: "tiger",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(100, 100, 120, 140), 0.9, 17);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert_eq!(ruling, BoxRuling::Skipped);
        assert_eq!(classifier.calls, 0);
        Ok(())
    }

    #[test]
    fn animal_box_is_classified() -> Result<()> {
        let mut classifier = FixedClassifier {
            label: "tiger",
            calls: 0,
        };
        let det = Detection::new(BoundingBox::new(5, 5, 30, 30), 0.9, 17);
        let ruling = triage_box(&det, &frame(), &settings(), &mut classifier)?;
        assert_eq!(
            ruling,
            BoxRuling::Animal(Classification {
                label: "tiger".to_string(),
                confidence: 0.9,
            })
        );
        Ok(())
    }
}
