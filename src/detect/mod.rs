mod backend;
mod backends;
mod classify;
mod result;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::{ScriptedBackend, ScriptedClassifier};
pub use classify::{triage_box, BoxRuling, Classification, Classifier, TriageSettings};
pub use result::{Detection, DetectionResult};
