//! Adapters the runner drives directly: the deterministic fault injector,
//! the tool executor envelope, the saga/compensation stack, and the demo
//! tool set that lets a task file actually exercise them end to end.

pub mod executor;
pub mod injector;
pub mod saga;
pub mod tools;

pub use executor::ToolExecutor;
pub use injector::FaultInjector;
pub use saga::{CompensationOutcome, CompensationRecord, SagaManager};
pub use tools::standard_registry;
