//! Metrics reducer: a single pass over a trace-event log producing the
//! comparable recovery-quality numbers the harness exists to measure.
//! Consumes nothing but [`fl_core::event::TraceEvent`]; whatever produced
//! the trace (engine, replayed fixture) is irrelevant to this crate.

use fl_core::event::{Action, DecisionSource, ErrorKind, EventType, Outcome, StepStatus, TraceEvent};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Default)]
pub struct MetricReport {
    pub total_tasks: usize,
    pub wcr: f64,
    pub hir: f64,
    pub rr_task: f64,
    pub rr_event: f64,
    pub mttr_event_ms: f64,
    pub cpt: f64,
    pub cps: f64,
    pub rco: f64,
    pub uar: f64,
    pub srr: f64,
    pub llm_calls: u64,
    pub by_first_error_kind_task: BTreeMap<String, u64>,
    pub by_error_kind_event: BTreeMap<String, u64>,
}

fn recoverable(action: Action) -> bool {
    matches!(action, Action::Retry | Action::Rollback | Action::RollbackThenRetry)
}

fn group_by_task(events: &[TraceEvent]) -> BTreeMap<String, Vec<&TraceEvent>> {
    let mut groups: BTreeMap<String, Vec<&TraceEvent>> = BTreeMap::new();
    for ev in events {
        groups.entry(ev.task_id.clone()).or_default().push(ev);
    }
    for v in groups.values_mut() {
        v.sort_by_key(|e| e.ts_ms);
    }
    groups
}

fn task_outcome(events: &[&TraceEvent]) -> Outcome {
    if let Some(last_final) = events.iter().rev().find(|e| e.event_type == EventType::Final) {
        if let Some(o) = last_final.final_outcome {
            return o;
        }
    }
    if events.iter().any(|e| e.recovery_action.as_deref() == Some(Action::Escalate.as_str())) {
        return Outcome::Escalated;
    }
    if let Some(last_step) = events.iter().rev().find(|e| e.event_type == EventType::ToolCall) {
        if last_step.status == StepStatus::Ok {
            return Outcome::Success;
        }
    }
    Outcome::Failed
}

pub fn reduce(events: &[TraceEvent]) -> MetricReport {
    let groups = group_by_task(events);
    let total_tasks = groups.len().max(1);

    let mut completed = 0u64;
    let mut escalated = 0u64;
    let mut error_tasks = 0u64;
    let mut recovered_tasks = 0u64;
    let mut uar_tasks = 0u64;

    let mut total_calls = 0u64;
    let mut total_base = 0u64;
    let mut total_overhead = 0u64;

    let mut total_error_events = 0u64;
    let mut recovered_events = 0u64;
    let mut mttr_sum_ms = 0f64;

    let mut srr_eligible = 0u64;
    let mut srr_pass = 0u64;

    let mut llm_calls = 0u64;
    let mut by_first_error_kind_task: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_error_kind_event: BTreeMap<String, u64> = BTreeMap::new();

    for (_task_id, task_events) in &groups {
        let outcome = task_outcome(task_events);
        match outcome {
            Outcome::Success => completed += 1,
            Outcome::Escalated => escalated += 1,
            Outcome::Failed => {}
        }

        let tool_calls: Vec<&&TraceEvent> = task_events.iter().filter(|e| e.event_type == EventType::ToolCall).collect();
        let actual_calls = tool_calls.len() as u64;
        total_calls += actual_calls;

        let mut distinct_steps = std::collections::BTreeSet::new();
        for e in &tool_calls {
            distinct_steps.insert(e.step_idx);
        }
        let base_calls = distinct_steps.len() as u64;
        total_base += base_calls;
        total_overhead += actual_calls.saturating_sub(base_calls);

        let error_events: Vec<&&&TraceEvent> = tool_calls.iter().filter(|e| e.status == StepStatus::Error).collect();
        if !error_events.is_empty() {
            error_tasks += 1;
            if outcome == Outcome::Success {
                recovered_tasks += 1;
            }
            if let Some(first) = error_events.first() {
                if let Some(kind) = first.error_kind {
                    *by_first_error_kind_task.entry(kind.as_str().to_string()).or_insert(0) += 1;
                }
            }
        }

        if tool_calls.iter().any(|e| matches!(e.error_kind, Some(ErrorKind::AuthDenied) | Some(ErrorKind::PolicyRejected))) {
            uar_tasks += 1;
        }

        for e in &tool_calls {
            if e.status == StepStatus::Error {
                total_error_events += 1;
                if let Some(kind) = e.error_kind {
                    *by_error_kind_event.entry(kind.as_str().to_string()).or_insert(0) += 1;
                }
                let recovers = e
                    .recovery_action
                    .as_deref()
                    .and_then(action_from_wire)
                    .map(recoverable)
                    .unwrap_or(false);
                if recovers {
                    if let Some(later) = tool_calls
                        .iter()
                        .filter(|o| o.step_idx == e.step_idx && o.status == StepStatus::Ok && o.ts_ms >= e.ts_ms)
                        .min_by_key(|o| o.ts_ms)
                    {
                        recovered_events += 1;
                        mttr_sum_ms += (later.ts_ms - e.ts_ms) as f64;
                    }
                }
            }
            if e.decision_source == Some(DecisionSource::Diagnosis) {
                llm_calls += 1;
            }
        }

        if let Some(last_final) = task_events.iter().rev().find(|e| e.event_type == EventType::Final) {
            if last_final.srr_eligible == Some(true) {
                srr_eligible += 1;
                if last_final.srr_pass == Some(true) {
                    srr_pass += 1;
                }
            }
        }
    }

    MetricReport {
        total_tasks: groups.len(),
        wcr: completed as f64 / total_tasks as f64,
        hir: escalated as f64 / total_tasks as f64,
        rr_task: if error_tasks == 0 { 0.0 } else { recovered_tasks as f64 / error_tasks as f64 },
        rr_event: if total_error_events == 0 { 0.0 } else { recovered_events as f64 / total_error_events as f64 },
        mttr_event_ms: if recovered_events == 0 { 0.0 } else { mttr_sum_ms / recovered_events as f64 },
        cpt: total_calls as f64 / total_tasks as f64,
        cps: total_calls as f64 / completed.max(1) as f64,
        rco: if total_base == 0 { 0.0 } else { total_overhead as f64 / total_base as f64 },
        uar: uar_tasks as f64 / total_tasks as f64,
        srr: if srr_eligible == 0 { 0.0 } else { srr_pass as f64 / srr_eligible as f64 },
        llm_calls,
        by_first_error_kind_task,
        by_error_kind_event,
    }
}

fn action_from_wire(s: &str) -> Option<Action> {
    let bare = s.rsplit(':').next().unwrap_or(s);
    match bare {
        "retry" => Some(Action::Retry),
        "rollback" => Some(Action::Rollback),
        "rollback_then_retry" => Some(Action::RollbackThenRetry),
        "compensate" => Some(Action::Compensate),
        "escalate" => Some(Action::Escalate),
        "fail" => Some(Action::Fail),
        _ => None,
    }
}
