use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read task file: {0}")]
    TaskFile(#[from] fl_persistence::PersistenceError),
    #[error("memory bank unavailable: {0}")]
    Memory(fl_persistence::PersistenceError),
    #[error("could not open trace output: {0}")]
    TraceOut(#[source] std::io::Error),
    #[error("task {task_id} failed: {source}")]
    Engine { task_id: String, #[source] source: fl_core::EngineError },
}
