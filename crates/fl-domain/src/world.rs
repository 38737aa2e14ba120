//! World state: the mutable substrate every tool call reads and writes.
//!
//! Three user-visible mappings (`records`, `inventory`, `audit_log`) plus two
//! maps private to the fault injector (`fault_plan`, `fault_state`) that let
//! `once`/`stateful_conflict` firing survive a rollback, since a rollback
//! only resets `records`/`inventory`, see [`WorldState::restore`].

use fl_core::hashing::hash_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditEntry {
    pub action: String,
    pub detail: Option<Value>,
}

/// Per-fault bookkeeping the injector needs across the lifetime of a task.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FaultRuntimeState {
    /// Set once a `once`/`persistent`/`stateful_conflict` fault has been sampled.
    pub sampled: Option<bool>,
    /// For `stateful_conflict`: audit-log rollback count observed at activation.
    pub rollback_count_at_activation: Option<usize>,
    /// For `stateful_conflict`: true once a rollback has cleared the fault.
    pub resolved: bool,
    /// For `once`: true after the fault has fired exactly one time.
    pub fired_once: bool,
}

/// Deep-copyable snapshot of the parts of the world a rollback restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub records: BTreeMap<String, Value>,
    pub inventory: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldState {
    pub records: BTreeMap<String, Value>,
    pub inventory: BTreeMap<String, i64>,
    pub audit_log: Vec<AuditEntry>,
    #[serde(default)]
    pub fault_plan: BTreeMap<String, bool>,
    #[serde(default)]
    pub fault_state: BTreeMap<String, FaultRuntimeState>,
}

impl WorldState {
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint { records: self.records.clone(), inventory: self.inventory.clone() }
    }

    /// Restores `records`/`inventory` from `cp` and appends a rollback audit
    /// entry. `audit_log` itself is append-only for the whole task, it is
    /// never reset, so the injector's rollback-count bookkeeping stays
    /// monotone across rollbacks.
    pub fn restore(&mut self, cp: &Checkpoint) {
        self.records = cp.records.clone();
        self.inventory = cp.inventory.clone();
        self.audit_log.push(AuditEntry { action: "rollback".to_string(), detail: None });
    }

    pub fn rollback_count(&self) -> usize {
        self.audit_log.iter().filter(|e| e.action == "rollback").count()
    }

    pub fn content_hash(&self) -> String {
        let snapshot = serde_json::json!({
            "records": self.records,
            "inventory": self.inventory,
            "audit_log": self.audit_log,
        });
        hash_value(&snapshot)
    }

    pub fn hash_prefix(&self, len: usize) -> String {
        let h = self.content_hash();
        h.chars().take(len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_identical_snapshots_hash_equal() {
        let mut a = WorldState::default();
        a.records.insert("r1".into(), serde_json::json!({"status": "pending"}));
        let b = a.clone();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn restore_resets_records_and_appends_rollback() {
        let mut w = WorldState::default();
        w.records.insert("r1".into(), serde_json::json!({"status": "pending"}));
        let cp = w.checkpoint();
        w.records.insert("r1".into(), serde_json::json!({"status": "approved"}));
        w.restore(&cp);
        assert_eq!(w.records["r1"]["status"], "pending");
        assert_eq!(w.rollback_count(), 1);
    }

    #[test]
    fn rollback_count_survives_further_mutation() {
        let mut w = WorldState::default();
        let cp = w.checkpoint();
        w.restore(&cp);
        w.records.insert("x".into(), serde_json::json!(1));
        w.restore(&cp);
        assert_eq!(w.rollback_count(), 2);
    }
}
