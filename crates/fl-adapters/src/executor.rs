//! Tool executor: the single envelope every step runs through, whether or
//! not a fault fires. Latency is sampled deterministically from the seed so
//! `MTTR_event`/`CPT` numbers reproduce across runs.

use fl_core::clock::Clock;
use fl_core::hashing::seeded_u64;
use fl_domain::fault::FaultConfig;
use fl_domain::step_result::StepResult;
use fl_domain::tool::Tool;
use fl_domain::world::WorldState;
use serde_json::Value;
use std::time::Duration;

pub struct ToolExecutor {
    seed: u64,
}

impl ToolExecutor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn sample_latency_ms(&self, task_id: &str, step_idx: usize, attempt_idx: u32, lo: u64, hi: u64) -> u64 {
        let v = seeded_u64(self.seed, &[task_id, "latency", &step_idx.to_string(), &attempt_idx.to_string()]);
        lo + v % (hi - lo + 1)
    }

    pub fn execute(
        &self,
        tool: &dyn Tool,
        world: &mut WorldState,
        params: &Value,
        injected: Option<&FaultConfig>,
        task_id: &str,
        step_idx: usize,
        attempt_idx: u32,
        clock: &dyn Clock,
    ) -> StepResult {
        if let Some(cfg) = injected {
            let (lo, hi) = latency_range(cfg.kind);
            let latency = self.sample_latency_ms(task_id, step_idx, attempt_idx, lo, hi);
            clock.sleep(Duration::from_millis(latency));
            let layer = cfg.layer_override.unwrap_or_else(|| cfg.kind.default_layer());
            return StepResult::error(cfg.kind, cfg.kind.canonical_message(), latency, Some((cfg.clone(), layer)));
        }

        let base_latency = self.sample_latency_ms(task_id, step_idx, attempt_idx, 10, 40);
        clock.sleep(Duration::from_millis(base_latency));
        match tool.call(world, params) {
            Ok(output) => StepResult::ok(output, base_latency),
            Err(err) => StepResult::error(err.kind, err.message, base_latency, None),
        }
    }
}

fn latency_range(kind: fl_core::event::ErrorKind) -> (u64, u64) {
    use fl_core::event::ErrorKind::*;
    match kind {
        Timeout => (200, 400),
        Http500 => (100, 250),
        BadRequest => (20, 60),
        AuthDenied => (20, 60),
        NotFound => (30, 80),
        Conflict => (50, 150),
        PolicyRejected => (20, 60),
        StateCorruption => (100, 300),
        RuntimeError => (10, 40),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_core::clock::VirtualClock;
    use fl_core::event::ErrorKind;
    use fl_domain::fault::FaultMode;
    use fl_domain::tool::ToolError;

    struct AlwaysOk;
    impl Tool for AlwaysOk {
        fn name(&self) -> &str {
            "always_ok"
        }
        fn call(&self, _world: &mut WorldState, _params: &Value) -> Result<Value, ToolError> {
            Ok(serde_json::json!({"ok": true}))
        }
    }

    #[test]
    fn injected_fault_produces_canonical_message() {
        let exec = ToolExecutor::new(1);
        let mut world = WorldState::default();
        let cfg = FaultConfig {
            fault_id: "f1".into(),
            step_idx: 0,
            kind: ErrorKind::Timeout,
            probability: 1.0,
            mode: FaultMode::Once,
            scenario: None,
            force_first_attempt: false,
            layer_override: None,
        };
        let clock = VirtualClock::new();
        let result = exec.execute(&AlwaysOk, &mut world, &serde_json::json!({}), Some(&cfg), "t1", 0, 0, &clock);
        assert_eq!(result.error_message.unwrap(), "Request timeout after 30s");
    }

    #[test]
    fn no_injection_calls_tool_forward_op() {
        let exec = ToolExecutor::new(1);
        let mut world = WorldState::default();
        let clock = VirtualClock::new();
        let result = exec.execute(&AlwaysOk, &mut world, &serde_json::json!({}), None, "t1", 0, 0, &clock);
        assert_eq!(result.output.unwrap(), serde_json::json!({"ok": true}));
    }
}
