//! Oracle / consistency checker: the success predicate the runner consults
//! once the plan is exhausted, plus the post-run invariants that back the
//! safe-rollback metric when a task's recovery involved compensation.

use fl_domain::task::TaskDescriptor;
use fl_domain::world::WorldState;

/// Evaluates a task's `success_condition`: the named record must currently
/// carry the expected `status` field.
pub fn evaluate_success(task: &TaskDescriptor, world: &WorldState) -> bool {
    world
        .records
        .get(&task.success_condition.record_id)
        .and_then(|r| r.get("status"))
        .and_then(serde_json::Value::as_str)
        == Some(task.success_condition.expected_status.as_str())
}

/// Post-run consistency predicate backing the safe-rollback rate: inventory
/// must have settled non-negative, and no compensation obligation may be
/// left dangling on the saga stack.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyReport {
    pub inventory_conserved: bool,
    pub no_orphaned_records: bool,
}

impl ConsistencyReport {
    pub fn pass(&self) -> bool {
        self.inventory_conserved && self.no_orphaned_records
    }
}

pub fn check_consistency(world: &WorldState, saga_depth: usize) -> ConsistencyReport {
    let inventory_conserved = world.inventory.values().all(|&v| v >= 0);
    let no_orphaned_records = saga_depth == 0;
    ConsistencyReport { inventory_conserved, no_orphaned_records }
}
