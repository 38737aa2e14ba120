//! Diagnosis-classifier backends. Kept as a separate crate so a real
//! model-backed implementation can be swapped in behind the
//! [`diagnosis::DiagnosisClassifier`] trait object without touching the
//! recovery policy or the runner.

pub mod diagnosis;

pub use diagnosis::{Diagnosis, DiagnosisClassifier, DiagnosisError, ExternalBackend, FailureInfo, HeuristicBackend, RecoveryHistory, StepContext};
