//! Engine-level errors (fatal to a task, as opposed to tool-level
//! [`crate::event::ErrorKind`] results which are data, not `Err`).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EngineError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("step index {0} out of range")]
    InvalidStepIndex(usize),
    #[error("budget exhausted")]
    BudgetExhausted,
    #[error("compensation failed: {0}")]
    CompensationFailed(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("internal: {0}")]
    Internal(String),
}
