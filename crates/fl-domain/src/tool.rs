//! Tool registry: name -> {forward operation, optional compensator,
//! irreversibility flag, compensator argument projection}.

use crate::world::WorldState;
use fl_core::event::ErrorKind;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// A single tool's forward operation and, optionally, its inverse.
/// Implementations hold no state of their own; all mutation happens through
/// the `world` argument so tasks can be replayed from a fresh `WorldState`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn call(&self, world: &mut WorldState, params: &Value) -> Result<Value, ToolError>;
    fn compensate(&self, _world: &mut WorldState, _params: &Value) -> Result<(), ToolError> {
        Ok(())
    }
    fn has_compensator(&self) -> bool {
        false
    }
    fn irreversible(&self) -> bool {
        false
    }
    /// Parameter keys projected from the forward call into the compensator's
    /// arguments when a saga pushes this call onto its stack.
    fn compensator_keys(&self) -> &[&str] {
        &[]
    }
}

pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: BTreeMap::new() }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|b| b.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

/// Projects `keys` out of `params` into a fresh object, for saga compensator
/// arguments.
pub fn project_params(params: &Value, keys: &[&str]) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(obj) = params.as_object() {
        for k in keys {
            if let Some(v) = obj.get(*k) {
                out.insert((*k).to_string(), v.clone());
            }
        }
    }
    Value::Object(out)
}
