//! Workflow runner: drives one task's plan against its tools, budget,
//! fault injector and recovery policy to a terminal outcome, and the
//! success/consistency oracle it consults along the way.

pub mod oracle;
pub mod runner;

pub use oracle::{ConsistencyReport, check_consistency, evaluate_success};
pub use runner::Runner;
