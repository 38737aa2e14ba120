//! Saga/compensation stack: records successful forward calls that have an
//! inverse, and replays the inverses in reverse order on rollback.

use fl_domain::tool::{ToolError, ToolRegistry, project_params};
use fl_domain::world::WorldState;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CompensationRecord {
    pub tool_name: String,
    pub step_name: String,
    pub params: Value,
}

/// Outcome of replaying one compensator during rollback.
pub struct CompensationOutcome {
    pub tool_name: String,
    pub step_name: String,
    pub params: Value,
    pub result: Result<(), ToolError>,
}

#[derive(Default)]
pub struct SagaManager {
    stack: Vec<CompensationRecord>,
}

impl SagaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Discards any pending compensation obligations once the task they
    /// belong to has committed as a whole; the forward calls they'd undo
    /// are no longer in flight, so nothing is left to roll back.
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Pushes a compensation record for a successful forward call, if the
    /// tool that made it is reversible and carries a compensator.
    pub fn push_if_reversible(&mut self, tool: &dyn fl_domain::tool::Tool, step_name: &str, full_params: &Value) {
        if tool.has_compensator() && !tool.irreversible() {
            let projected = project_params(full_params, tool.compensator_keys());
            self.stack.push(CompensationRecord {
                tool_name: tool.name().to_string(),
                step_name: step_name.to_string(),
                params: projected,
            });
        }
    }

    /// Pops the stack end-to-start, invoking each compensator against
    /// `world`. Stops at (and includes) the first failure; the caller is
    /// responsible for escalating on a failed outcome.
    pub fn rollback(&mut self, registry: &ToolRegistry, world: &mut WorldState) -> Vec<CompensationOutcome> {
        let mut outcomes = Vec::new();
        while let Some(record) = self.stack.pop() {
            let result = match registry.get(&record.tool_name) {
                Some(tool) => tool.compensate(world, &record.params),
                None => Err(ToolError::new(
                    fl_core::event::ErrorKind::RuntimeError,
                    format!("compensator for unknown tool {}", record.tool_name),
                )),
            };
            let failed = result.is_err();
            outcomes.push(CompensationOutcome {
                tool_name: record.tool_name,
                step_name: record.step_name,
                params: record.params,
                result,
            });
            if failed {
                break;
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_domain::tool::Tool;
    use serde_json::json;

    struct Reversible;
    impl Tool for Reversible {
        fn name(&self) -> &str {
            "update_record"
        }
        fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
            world.records.insert("r1".into(), params.clone());
            Ok(json!({}))
        }
        fn compensate(&self, world: &mut WorldState, _params: &Value) -> Result<(), ToolError> {
            world.records.insert("r1".into(), json!({"status": "reverted"}));
            Ok(())
        }
        fn has_compensator(&self) -> bool {
            true
        }
        fn compensator_keys(&self) -> &[&str] {
            &["record_id"]
        }
    }

    #[test]
    fn rollback_replays_in_reverse_and_empties_stack() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Reversible));
        let mut saga = SagaManager::new();
        let mut world = WorldState::default();
        saga.push_if_reversible(registry.get("update_record").unwrap(), "step1", &json!({"record_id": "r1"}));
        assert_eq!(saga.depth(), 1);
        let outcomes = saga.rollback(&registry, &mut world);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
        assert!(saga.is_empty());
        assert_eq!(world.records["r1"]["status"], "reverted");
    }

    #[test]
    fn clear_discards_pending_compensations() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Reversible));
        let mut saga = SagaManager::new();
        saga.push_if_reversible(registry.get("update_record").unwrap(), "step1", &json!({"record_id": "r1"}));
        assert_eq!(saga.depth(), 1);
        saga.clear();
        assert!(saga.is_empty());
    }

    #[test]
    fn irreversible_tool_is_never_pushed() {
        struct Irrev;
        impl Tool for Irrev {
            fn name(&self) -> &str {
                "send_email"
            }
            fn call(&self, _world: &mut WorldState, _params: &Value) -> Result<Value, ToolError> {
                Ok(json!({}))
            }
            fn irreversible(&self) -> bool {
                true
            }
        }
        let mut saga = SagaManager::new();
        saga.push_if_reversible(&Irrev, "step1", &json!({}));
        assert!(saga.is_empty());
    }
}
