//! Task descriptor: the on-disk (and in-memory) shape of one task. Parsing
//! from line-delimited files lives in `fl-persistence`; this crate only owns
//! the data shape everything else agrees on.

use crate::fault::FaultConfig;
use crate::world::{AuditEntry, WorldState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStep {
    pub step_idx: usize,
    pub step_name: String,
    pub tool_name: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessCondition {
    pub record_id: String,
    pub expected_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InitialWorldState {
    #[serde(default)]
    pub records: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub inventory: BTreeMap<String, i64>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: String,
    pub initial_world_state: InitialWorldState,
    pub steps: Vec<TaskStep>,
    #[serde(default)]
    pub fault_injections: Vec<FaultConfig>,
    pub success_condition: SuccessCondition,
}

impl TaskDescriptor {
    pub fn build_world(&self) -> WorldState {
        WorldState {
            records: self.initial_world_state.records.clone(),
            inventory: self.initial_world_state.inventory.clone(),
            audit_log: self.initial_world_state.audit_log.clone(),
            fault_plan: BTreeMap::new(),
            fault_state: BTreeMap::new(),
        }
    }

    pub fn fault_for_step(&self, step_idx: usize) -> Option<&FaultConfig> {
        self.fault_injections.iter().find(|f| f.step_idx == step_idx)
    }
}
