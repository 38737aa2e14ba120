use crate::fault::FaultConfig;
use fl_core::event::{ErrorKind, InjectedFault, StepStatus};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct StepResult {
    pub status: StepStatus,
    pub output: Option<Value>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
    pub latency_ms: u64,
    pub injected_fault: Option<InjectedFault>,
}

impl StepResult {
    pub fn ok(output: Value, latency_ms: u64) -> Self {
        Self {
            status: StepStatus::Ok,
            output: Some(output),
            error_kind: None,
            error_message: None,
            error_trace: None,
            latency_ms,
            injected_fault: None,
        }
    }

    pub fn error(
        kind: ErrorKind,
        message: impl Into<String>,
        latency_ms: u64,
        injected: Option<(FaultConfig, fl_core::event::Layer)>,
    ) -> Self {
        let message = message.into();
        let injected_fault = injected.map(|(cfg, layer)| InjectedFault {
            fault_id: cfg.fault_id.clone(),
            kind: cfg.kind,
            layer,
            scenario: cfg.scenario.clone(),
        });
        Self {
            status: StepStatus::Error,
            output: None,
            error_kind: Some(kind),
            error_message: Some(message.clone()),
            error_trace: Some(message),
            latency_ms,
            injected_fault,
        }
    }
}
