//! Trace event types emitted by the runner.
//!
//! Role in the flow:
//! - Every step the runner takes emits one `TraceEvent` to an append-only
//!   `TraceStore`.
//! - The metrics reducer and the RCA/consistency evaluator consume nothing
//!   but this stream: it is the sole observable contract of a run.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of tool-level error kinds. Carries both the wire tag (via
/// serde) and the default layer mapping (see [`ErrorKind::default_layer`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Http500,
    BadRequest,
    AuthDenied,
    NotFound,
    Conflict,
    PolicyRejected,
    StateCorruption,
    RuntimeError,
}

impl ErrorKind {
    pub fn canonical_message(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "Request timeout after 30s",
            ErrorKind::Http500 => "Internal server error",
            ErrorKind::BadRequest => "Invalid request parameters",
            ErrorKind::AuthDenied => "Authentication denied",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Conflict => "Resource conflict detected",
            ErrorKind::PolicyRejected => "Policy violation detected",
            ErrorKind::StateCorruption => "State corruption detected",
            ErrorKind::RuntimeError => "Unexpected runtime error",
        }
    }

    pub fn default_layer(self) -> Layer {
        match self {
            ErrorKind::Timeout | ErrorKind::Http500 => Layer::Transient,
            ErrorKind::Conflict | ErrorKind::StateCorruption => Layer::Cascade,
            ErrorKind::AuthDenied | ErrorKind::PolicyRejected | ErrorKind::BadRequest => Layer::Semantic,
            ErrorKind::NotFound | ErrorKind::RuntimeError => Layer::Persistent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http500 => "http_500",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::AuthDenied => "auth_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PolicyRejected => "policy_rejected",
            ErrorKind::StateCorruption => "state_corruption",
            ErrorKind::RuntimeError => "runtime_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Transient,
    Persistent,
    Semantic,
    Cascade,
}

/// Recovery actions the policy/diagnosis layer can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Retry,
    Rollback,
    RollbackThenRetry,
    Compensate,
    Escalate,
    Fail,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Retry => "retry",
            Action::Rollback => "rollback",
            Action::RollbackThenRetry => "rollback_then_retry",
            Action::Compensate => "compensate",
            Action::Escalate => "escalate",
            Action::Fail => "fail",
        }
    }
}

/// Where a recovery decision came from, used both for the `source:` prefix
/// on the wire recovery_action string and as a structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Rule,
    Diagnosis,
    Memory,
}

impl DecisionSource {
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            DecisionSource::Rule => None,
            DecisionSource::Diagnosis => Some("diagnosis"),
            DecisionSource::Memory => Some("memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ToolCall,
    Recovery,
    Compensation,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
    Escalated,
}

/// Remaining/used counters for one budget dimension, snapshotted onto every
/// trace event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct BudgetSnapshot {
    pub tokens_used: u64,
    pub tokens_remaining: i64,
    pub calls_used: u64,
    pub calls_remaining: i64,
    pub seconds_used: f64,
    pub seconds_remaining: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectedFault {
    pub fault_id: String,
    pub kind: ErrorKind,
    pub layer: Layer,
    pub scenario: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub task_id: String,
    pub step_idx: usize,
    pub step_name: String,
    pub tool_name: String,
    pub params: Value,
    pub status: StepStatus,
    pub latency_ms: u64,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub injected_fault: Option<InjectedFault>,
    pub post_state_hash: Option<String>,
    pub budget: BudgetSnapshot,
    pub recovery_action: Option<String>,
    pub decision_source: Option<DecisionSource>,
    pub attempt_idx: u32,
    pub event_type: EventType,
    pub ts_ms: i64,
    pub saga_depth: usize,
    pub diagnosis: Option<Value>,
    pub final_outcome: Option<Outcome>,
    pub final_reason: Option<String>,
    pub srr_eligible: Option<bool>,
    pub srr_pass: Option<bool>,
}

impl TraceEvent {
    pub fn stamp(&mut self) {
        self.ts_ms = Utc::now().timestamp_millis();
    }
}

pub fn now_ts_ms() -> i64 {
    let n: DateTime<Utc> = Utc::now();
    n.timestamp_millis()
}
