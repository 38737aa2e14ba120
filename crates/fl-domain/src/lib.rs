//! Domain model for the fault-recovery harness: the world state tools
//! mutate, the tool registry, fault configuration, step results and task
//! descriptors. No control flow lives here, that is `fl-engine`'s job.

pub mod fault;
pub mod step_result;
pub mod task;
pub mod tool;
pub mod world;

pub use fault::{FaultConfig, FaultMode, FaultSignature};
pub use step_result::StepResult;
pub use task::{InitialWorldState, SuccessCondition, TaskDescriptor, TaskStep};
pub use tool::{Tool, ToolError, ToolRegistry, project_params};
pub use world::{AuditEntry, Checkpoint, FaultRuntimeState, WorldState};
