mod stub;

pub use stub::{ScriptedBackend, ScriptedClassifier};
