//! End-to-end runs of the full stack (registry, injector, executor, policy,
//! saga, oracle) wired the way a CLI invocation would wire them, one per
//! named recovery strategy.

use fl_adapters::standard_registry;
use fl_core::clock::VirtualClock;
use fl_core::event::{DecisionSource, ErrorKind, EventType, InMemoryTraceStore, Outcome, StepStatus, TraceStore};
use fl_core::BudgetLimits;
use fl_domain::fault::{FaultConfig, FaultMode};
use fl_domain::task::{InitialWorldState, SuccessCondition, TaskDescriptor, TaskStep};
use fl_engine::Runner;
use fl_persistence::MemoryBank;
use fl_policies::{RecoveryPolicy, Strategy};
use fl_providers::HeuristicBackend;
use std::collections::BTreeMap;
use std::sync::Arc;

fn world_with_record(record_id: &str, status: &str) -> InitialWorldState {
    let mut records = BTreeMap::new();
    records.insert(record_id.to_string(), serde_json::json!({"status": status}));
    InitialWorldState { records, inventory: BTreeMap::new(), audit_log: vec![] }
}

fn policy(strategy: Strategy, memory: Option<Arc<MemoryBank>>) -> RecoveryPolicy {
    RecoveryPolicy::new(strategy, Box::new(HeuristicBackend::new(1)), memory)
}

fn runner_with(registry: &fl_domain::tool::ToolRegistry, strategy: Strategy, saga_enabled: bool) -> Runner<'_> {
    Runner::new(
        registry,
        policy(strategy, None),
        1,
        saga_enabled,
        Arc::new(VirtualClock::new()),
        BudgetLimits::default(),
    )
}

#[test]
fn b0_never_recovers_single_timeout_fails_with_one_event() {
    let registry = standard_registry();
    let runner = runner_with(&registry, Strategy::B0, false);
    let task = TaskDescriptor {
        task_id: "b0-timeout".into(),
        initial_world_state: world_with_record("REC1", "pending"),
        steps: vec![TaskStep {
            step_idx: 0,
            step_name: "get".into(),
            tool_name: "get_record".into(),
            params: serde_json::json!({"record_id": "REC1"}),
        }],
        fault_injections: vec![FaultConfig {
            fault_id: "f0".into(),
            step_idx: 0,
            kind: ErrorKind::Timeout,
            probability: 1.0,
            mode: FaultMode::Once,
            scenario: None,
            force_first_attempt: false,
            layer_override: None,
        }],
        success_condition: SuccessCondition { record_id: "REC1".into(), expected_status: "pending".into() },
    };

    let mut trace = InMemoryTraceStore::new();
    let outcome = runner.run_task(&task, &mut trace).unwrap();

    assert_eq!(outcome, Outcome::Failed);
    let events = trace.list(&task.task_id);
    let tool_calls: Vec<_> = events.iter().filter(|e| e.event_type == EventType::ToolCall).collect();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].error_kind, Some(ErrorKind::Timeout));
    let fin = events.iter().find(|e| e.event_type == EventType::Final).unwrap();
    assert_eq!(fin.final_reason.as_deref(), Some("Timeout"));
}

#[test]
fn b1_fixed_retry_exhausts_three_attempts_then_fails() {
    let registry = standard_registry();
    let runner = runner_with(&registry, Strategy::B1, false);
    let task = TaskDescriptor {
        task_id: "b1-timeout".into(),
        initial_world_state: world_with_record("REC1", "pending"),
        steps: vec![TaskStep {
            step_idx: 0,
            step_name: "get".into(),
            tool_name: "get_record".into(),
            params: serde_json::json!({"record_id": "REC1"}),
        }],
        fault_injections: vec![FaultConfig {
            fault_id: "f0".into(),
            step_idx: 0,
            kind: ErrorKind::Timeout,
            probability: 1.0,
            mode: FaultMode::PerAttempt,
            scenario: None,
            force_first_attempt: false,
            layer_override: None,
        }],
        success_condition: SuccessCondition { record_id: "REC1".into(), expected_status: "pending".into() },
    };

    let mut trace = InMemoryTraceStore::new();
    let outcome = runner.run_task(&task, &mut trace).unwrap();

    assert_eq!(outcome, Outcome::Failed);
    let events = trace.list(&task.task_id);
    let tool_calls: Vec<_> = events.iter().filter(|e| e.event_type == EventType::ToolCall).collect();
    assert_eq!(tool_calls.len(), 4);
    assert!(tool_calls.iter().all(|e| e.status == StepStatus::Error));
    assert_eq!(tool_calls.last().unwrap().recovery_action.as_deref(), Some("fail"));
}

fn conflict_task(task_id: &str, force_first_attempt: bool) -> TaskDescriptor {
    TaskDescriptor {
        task_id: task_id.into(),
        initial_world_state: world_with_record("REC1", "pending"),
        steps: vec![TaskStep {
            step_idx: 0,
            step_name: "approve".into(),
            tool_name: "update_record".into(),
            params: serde_json::json!({"record_id": "REC1", "status": "approved"}),
        }],
        fault_injections: vec![FaultConfig {
            fault_id: "f0".into(),
            step_idx: 0,
            kind: ErrorKind::Conflict,
            probability: 1.0,
            mode: FaultMode::StatefulConflict,
            scenario: None,
            force_first_attempt,
            layer_override: None,
        }],
        success_condition: SuccessCondition { record_id: "REC1".into(), expected_status: "approved".into() },
    }
}

#[test]
fn b2_rolls_back_a_stateful_conflict_then_retries_to_success() {
    let registry = standard_registry();
    let runner = runner_with(&registry, Strategy::B2, false);
    let task = conflict_task("b2-conflict", true);

    let mut trace = InMemoryTraceStore::new();
    let outcome = runner.run_task(&task, &mut trace).unwrap();

    assert_eq!(outcome, Outcome::Success);
    let events = trace.list(&task.task_id);
    let tool_calls: Vec<_> = events.iter().filter(|e| e.event_type == EventType::ToolCall).collect();
    assert_eq!(tool_calls.len(), 2);
    assert_eq!(tool_calls[0].status, StepStatus::Error);
    assert_eq!(tool_calls[0].recovery_action.as_deref(), Some("rollback"));
    assert_eq!(tool_calls[1].status, StepStatus::Ok);
    let fin = events.iter().find(|e| e.event_type == EventType::Final).unwrap();
    assert_eq!(fin.final_outcome, Some(Outcome::Success));
    assert!(fin.srr_eligible.is_none());
}

#[test]
fn b2_with_saga_emits_compensation_and_clean_consistency_report() {
    let registry = standard_registry();
    let runner = runner_with(&registry, Strategy::B2, true);
    let task = TaskDescriptor {
        task_id: "b2-saga".into(),
        initial_world_state: {
            let mut w = world_with_record("REC1", "pending");
            w.inventory.insert("widget".into(), 5);
            w
        },
        steps: vec![
            TaskStep {
                step_idx: 0,
                step_name: "approve".into(),
                tool_name: "update_record".into(),
                params: serde_json::json!({"record_id": "REC1", "status": "approved"}),
            },
            TaskStep {
                step_idx: 1,
                step_name: "reserve".into(),
                tool_name: "reserve_inventory".into(),
                params: serde_json::json!({"item_id": "widget", "qty": 1}),
            },
        ],
        fault_injections: vec![FaultConfig {
            fault_id: "f0".into(),
            step_idx: 1,
            kind: ErrorKind::Conflict,
            probability: 1.0,
            mode: FaultMode::StatefulConflict,
            scenario: None,
            force_first_attempt: true,
            layer_override: None,
        }],
        success_condition: SuccessCondition { record_id: "REC1".into(), expected_status: "approved".into() },
    };

    let mut trace = InMemoryTraceStore::new();
    let outcome = runner.run_task(&task, &mut trace).unwrap();

    assert_eq!(outcome, Outcome::Success);
    let events = trace.list(&task.task_id);
    let compensations: Vec<_> = events.iter().filter(|e| e.event_type == EventType::Compensation).collect();
    assert_eq!(compensations.len(), 1);
    assert_eq!(compensations[0].tool_name, "update_record");
    let fin = events.iter().find(|e| e.event_type == EventType::Final).unwrap();
    assert_eq!(fin.srr_eligible, Some(true));
    assert_eq!(fin.srr_pass, Some(true));
}

#[test]
fn b3_diagnosis_retries_not_found_once_then_succeeds() {
    let registry = standard_registry();
    let runner = runner_with(&registry, Strategy::B3, false);
    let task = TaskDescriptor {
        task_id: "b3-not-found".into(),
        initial_world_state: world_with_record("REC1", "pending"),
        steps: vec![TaskStep {
            step_idx: 0,
            step_name: "get".into(),
            tool_name: "get_record".into(),
            params: serde_json::json!({"record_id": "REC1"}),
        }],
        fault_injections: vec![FaultConfig {
            fault_id: "f0".into(),
            step_idx: 0,
            kind: ErrorKind::NotFound,
            probability: 1.0,
            mode: FaultMode::Once,
            scenario: Some("eventual_consistency".into()),
            force_first_attempt: false,
            layer_override: None,
        }],
        success_condition: SuccessCondition { record_id: "REC1".into(), expected_status: "pending".into() },
    };

    let mut trace = InMemoryTraceStore::new();
    let outcome = runner.run_task(&task, &mut trace).unwrap();

    assert_eq!(outcome, Outcome::Success);
    let events = trace.list(&task.task_id);
    let tool_calls: Vec<_> = events.iter().filter(|e| e.event_type == EventType::ToolCall).collect();
    assert_eq!(tool_calls.len(), 2);
    assert!(tool_calls[0].recovery_action.as_deref().unwrap().ends_with("retry"));
    assert_eq!(tool_calls[1].status, StepStatus::Ok);
}

#[test]
fn b4_learns_from_first_task_and_reuses_memory_for_later_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let bank = Arc::new(MemoryBank::load(dir.path().join("mem.json")).unwrap());
    let registry = standard_registry();
    let runner = Runner::new(
        &registry,
        policy(Strategy::B4, Some(bank.clone())),
        1,
        false,
        Arc::new(VirtualClock::new()),
        BudgetLimits::default(),
    );

    let mut first_trace = InMemoryTraceStore::new();
    let first_task = conflict_task("b4-task-1", true);
    let first_outcome = runner.run_task(&first_task, &mut first_trace).unwrap();
    assert_eq!(first_outcome, Outcome::Success);

    let first_events = first_trace.list(&first_task.task_id);
    let first_failure = first_events.iter().find(|e| e.status == StepStatus::Error).unwrap();
    assert!(first_failure.recovery_action.as_deref().unwrap().ends_with("rollback"));
    assert_ne!(first_failure.decision_source, Some(DecisionSource::Memory));
    assert_eq!(bank.len(), 1);

    for i in 2..=10 {
        let mut trace = InMemoryTraceStore::new();
        let task = conflict_task(&format!("b4-task-{i}"), true);
        let outcome = runner.run_task(&task, &mut trace).unwrap();
        assert_eq!(outcome, Outcome::Success);

        let events = trace.list(&task.task_id);
        let failure = events.iter().find(|e| e.status == StepStatus::Error).unwrap();
        assert_eq!(failure.decision_source, Some(DecisionSource::Memory));
        assert_eq!(failure.recovery_action.as_deref(), Some("memory:rollback"));
        let diagnosis = failure.diagnosis.as_ref().unwrap();
        let confidence = diagnosis.get("confidence").and_then(serde_json::Value::as_f64).unwrap();
        assert!(confidence >= 0.8);
    }
    assert_eq!(bank.len(), 1);
}
