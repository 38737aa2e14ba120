//! Demo tool set. The business semantics of individual tools are outside
//! this harness's subject matter; what matters is which tools are
//! reversible, which are irreversible, and what parameters their
//! compensators need. These implementations exist so a task file can
//! actually be driven end to end.

use fl_domain::tool::{Tool, ToolError, ToolRegistry};
use fl_domain::world::{AuditEntry, WorldState};
use fl_core::event::ErrorKind;
use serde_json::{Value, json};

fn record_id(params: &Value) -> Result<String, ToolError> {
    params
        .get("record_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::new(ErrorKind::BadRequest, "missing record_id"))
}

pub struct GetRecordTool;
impl Tool for GetRecordTool {
    fn name(&self) -> &str {
        "get_record"
    }
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
        let id = record_id(params)?;
        world
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::new(ErrorKind::NotFound, format!("record {id} not found")))
    }
}

pub struct UpdateRecordTool;
impl Tool for UpdateRecordTool {
    fn name(&self) -> &str {
        "update_record"
    }
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
        let id = record_id(params)?;
        let status = params
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::new(ErrorKind::BadRequest, "missing status"))?;
        let entry = world.records.entry(id.clone()).or_insert_with(|| json!({}));
        entry["status"] = json!(status);
        Ok(json!({"record_id": id, "status": status}))
    }
    fn compensate(&self, world: &mut WorldState, params: &Value) -> Result<(), ToolError> {
        world.audit_log.push(AuditEntry {
            action: "compensated_update_record".to_string(),
            detail: Some(params.clone()),
        });
        Ok(())
    }
    fn has_compensator(&self) -> bool {
        true
    }
    fn compensator_keys(&self) -> &[&str] {
        &["record_id", "status"]
    }
}

pub struct ReserveInventoryTool;
impl Tool for ReserveInventoryTool {
    fn name(&self) -> &str {
        "reserve_inventory"
    }
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
        let item = params
            .get("item_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::new(ErrorKind::BadRequest, "missing item_id"))?;
        let qty = params.get("qty").and_then(Value::as_i64).unwrap_or(1);
        let count = world.inventory.entry(item.to_string()).or_insert(0);
        if *count < qty {
            return Err(ToolError::new(ErrorKind::Conflict, "insufficient inventory"));
        }
        *count -= qty;
        Ok(json!({"item_id": item, "reserved": qty}))
    }
    fn compensate(&self, world: &mut WorldState, params: &Value) -> Result<(), ToolError> {
        let item = params.get("item_id").and_then(Value::as_str).unwrap_or_default();
        let qty = params.get("qty").and_then(Value::as_i64).unwrap_or(1);
        let count = world.inventory.entry(item.to_string()).or_insert(0);
        *count += qty;
        Ok(())
    }
    fn has_compensator(&self) -> bool {
        true
    }
    fn compensator_keys(&self) -> &[&str] {
        &["item_id", "qty"]
    }
}

pub struct CommitTool;
impl Tool for CommitTool {
    fn name(&self) -> &str {
        "commit"
    }
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
        let id = record_id(params)?;
        let entry = world.records.entry(id.clone()).or_insert_with(|| json!({}));
        entry["status"] = json!("committed");
        Ok(json!({"record_id": id, "status": "committed"}))
    }
    fn irreversible(&self) -> bool {
        true
    }
}

pub struct NotifyTool;
impl Tool for NotifyTool {
    fn name(&self) -> &str {
        "notify"
    }
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError> {
        world.audit_log.push(AuditEntry { action: "notified".to_string(), detail: Some(params.clone()) });
        Ok(json!({"notified": true}))
    }
    fn compensate(&self, world: &mut WorldState, params: &Value) -> Result<(), ToolError> {
        world.audit_log.push(AuditEntry { action: "retracted_notification".to_string(), detail: Some(params.clone()) });
        Ok(())
    }
    fn has_compensator(&self) -> bool {
        true
    }
    fn compensator_keys(&self) -> &[&str] {
        &["record_id"]
    }
}

/// Registry pre-populated with the standard demo tool set.
pub fn standard_registry() -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    reg.register(Box::new(GetRecordTool));
    reg.register(Box::new(UpdateRecordTool));
    reg.register(Box::new(ReserveInventoryTool));
    reg.register(Box::new(CommitTool));
    reg.register(Box::new(NotifyTool));
    reg
}
