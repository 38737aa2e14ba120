//! I/O-facing persistence: the file-backed memory bank, task-file loading,
//! and environment-derived run defaults. No diesel/sqlx here: the engine
//! is single-process and in-memory; the only thing that actually touches
//! disk is the memory bank and the task/trace files.

pub mod config;
pub mod error;
pub mod memory;
pub mod task;

pub use config::{DEFAULT_MEMORY_PATH, DEFAULT_SEED, env_defaults};
pub use error::PersistenceError;
pub use memory::{MemoryBank, MemoryEntry, MemoryMatch, MemoryStats};
pub use task::load_tasks;
