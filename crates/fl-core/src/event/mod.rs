pub mod store;
pub mod types;

pub use store::{FileTraceStore, InMemoryTraceStore, TraceStore};
pub use types::{
    Action, BudgetSnapshot, DecisionSource, ErrorKind, EventType, InjectedFault, Layer, Outcome,
    StepStatus, TraceEvent, now_ts_ms,
};
