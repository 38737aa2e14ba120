//! The workflow runner: the main state machine that drives one task's plan
//! to completion under a budget, consulting the recovery policy on every
//! tool-call failure and replaying the saga on rollback.
//!
//! `states: INIT -> RUNNING -> {COMPLETED, ESCALATED, FAILED}`, modelled
//! here as a single loop rather than an explicit state enum: each
//! iteration either advances the step cursor, re-attempts the current step,
//! or returns a terminal [`fl_core::event::Outcome`].

use fl_adapters::{FaultInjector, SagaManager, ToolExecutor};
use fl_core::clock::Clock;
use fl_core::errors::EngineError;
use fl_core::event::{Action, EventType, Outcome, StepStatus, TraceEvent, TraceStore};
use fl_core::{Budget, BudgetLimits};
use fl_domain::fault::FaultSignature;
use fl_domain::task::TaskDescriptor;
use fl_domain::tool::ToolRegistry;
use fl_domain::world::WorldState;
use fl_policies::RecoveryPolicy;
use fl_providers::{FailureInfo, RecoveryHistory, StepContext};
use serde_json::Value;
use std::sync::Arc;

use crate::oracle;

const SIGNATURE_KEYWORD_LIMIT: usize = 5;
const STATE_PREFIX_LEN: usize = 10;

pub struct Runner<'a> {
    registry: &'a ToolRegistry,
    executor: ToolExecutor,
    injector: FaultInjector,
    policy: RecoveryPolicy,
    clock: Arc<dyn Clock>,
    budget_limits: BudgetLimits,
    saga_enabled: bool,
}

impl<'a> Runner<'a> {
    pub fn new(
        registry: &'a ToolRegistry,
        policy: RecoveryPolicy,
        seed: u64,
        saga_enabled: bool,
        clock: Arc<dyn Clock>,
        budget_limits: BudgetLimits,
    ) -> Self {
        Self {
            registry,
            executor: ToolExecutor::new(seed),
            injector: FaultInjector::new(seed),
            policy,
            clock,
            budget_limits,
            saga_enabled,
        }
    }

    /// Drives `task` to a terminal outcome, appending every trace event to
    /// `trace`. Returns `Err` only for the engine-fatal conditions
    /// (unknown tool name, memory-bank persistence failure); everything
    /// else (tool errors, escalation, budget exhaustion) is a normal,
    /// `Ok`-wrapped terminal outcome.
    pub fn run_task(&self, task: &TaskDescriptor, trace: &mut dyn TraceStore) -> Result<Outcome, EngineError> {
        log::info!("task {} starting ({} steps)", task.task_id, task.steps.len());

        let mut world = task.build_world();
        let mut budget = Budget::new(self.budget_limits, self.clock.clone());
        let mut checkpoint = world.checkpoint();
        let mut saga = SagaManager::new();

        let mut step_idx = 0usize;
        let mut attempt_idx: u32 = 0;
        let mut any_compensation = false;
        let mut first_failure: Option<(FaultSignature, Action)> = None;
        let mut last_step_name = String::new();
        let mut last_tool_name = String::new();

        loop {
            if budget.exhausted() {
                log::warn!("task {} escalated: budget_exhausted", task.task_id);
                let outcome = Outcome::Escalated;
                self.finish(
                    task,
                    trace,
                    &world,
                    &budget,
                    saga.depth(),
                    any_compensation,
                    outcome,
                    Some("budget_exhausted".to_string()),
                    &last_step_name,
                    &last_tool_name,
                );
                self.learn(task, &first_failure, outcome)?;
                return Ok(outcome);
            }

            if step_idx >= task.steps.len() {
                break;
            }

            let step = &task.steps[step_idx];
            last_step_name = step.step_name.clone();
            last_tool_name = step.tool_name.clone();
            let tool = self
                .registry
                .get(&step.tool_name)
                .ok_or_else(|| EngineError::UnknownTool(step.tool_name.clone()))?;

            let fault_cfg = task.fault_for_step(step_idx);
            let pre_hash = world.content_hash();
            let fires = fault_cfg
                .map(|cfg| self.injector.decide(cfg, &task.task_id, step_idx, attempt_idx, &mut world))
                .unwrap_or(false);
            let injected = if fires { fault_cfg } else { None };

            log::debug!(
                "task {} step {} ({}) attempt {} fault_fires={}",
                task.task_id,
                step_idx,
                step.tool_name,
                attempt_idx,
                fires
            );

            let result = self.executor.execute(
                tool,
                &mut world,
                &step.params,
                injected,
                &task.task_id,
                step_idx,
                attempt_idx,
                self.clock.as_ref(),
            );

            let post_hash = world.content_hash();
            budget.consume(&step.params);
            let snapshot = budget.snapshot();

            match result.status {
                StepStatus::Ok => {
                    let mut ev = TraceEvent {
                        task_id: task.task_id.clone(),
                        step_idx,
                        step_name: step.step_name.clone(),
                        tool_name: step.tool_name.clone(),
                        params: step.params.clone(),
                        status: StepStatus::Ok,
                        latency_ms: result.latency_ms,
                        error_kind: None,
                        error_message: None,
                        injected_fault: None,
                        post_state_hash: Some(post_hash),
                        budget: snapshot,
                        recovery_action: None,
                        decision_source: None,
                        attempt_idx,
                        event_type: EventType::ToolCall,
                        ts_ms: 0,
                        saga_depth: saga.depth(),
                        diagnosis: None,
                        final_outcome: None,
                        final_reason: None,
                        srr_eligible: None,
                        srr_pass: None,
                    };
                    ev.stamp();
                    trace.append(ev);

                    if self.saga_enabled {
                        saga.push_if_reversible(tool, &step.step_name, &step.params);
                    }
                    checkpoint = world.checkpoint();
                    attempt_idx = 0;
                    step_idx += 1;
                }
                StepStatus::Error => {
                    let kind = result.error_kind.expect("error result carries a kind");
                    let message = result.error_message.clone().unwrap_or_default();
                    let trace_text = result.error_trace.clone().unwrap_or_default();
                    let keywords = FaultSignature::extract_keywords(
                        &format!("{message} {trace_text}"),
                        SIGNATURE_KEYWORD_LIMIT,
                    );
                    let signature = FaultSignature {
                        tool_name: step.tool_name.clone(),
                        error_kind: kind,
                        step_name: step.step_name.clone(),
                        state_prefix: pre_hash.chars().take(STATE_PREFIX_LEN).collect(),
                        keywords,
                    };

                    let scenario = result.injected_fault.as_ref().and_then(|f| f.scenario.clone());
                    let failure = FailureInfo { kind, message: &message, injected_layer: result.injected_fault.as_ref().map(|f| f.layer) };
                    let ctx = StepContext {
                        task_id: &task.task_id,
                        step_idx,
                        step_name: &step.step_name,
                        tool_name: &step.tool_name,
                        scenario: scenario.as_deref(),
                    };
                    let history = RecoveryHistory { retry_count: attempt_idx };

                    let decision = self.policy.decide(
                        &failure,
                        &ctx,
                        &history,
                        &signature,
                        budget.remaining_calls(),
                        budget.snapshot().seconds_remaining,
                    );

                    if first_failure.is_none() {
                        first_failure = Some((signature, decision.action));
                    }

                    log::debug!(
                        "task {} step {} recovery decision: {:?} (source={:?}, confidence={:?})",
                        task.task_id,
                        step_idx,
                        decision.action,
                        decision.source,
                        decision.confidence
                    );

                    let wire_label = match decision.source.prefix() {
                        Some(prefix) => format!("{prefix}:{}", decision.action.as_str()),
                        None => decision.action.as_str().to_string(),
                    };
                    let diagnosis_payload = serde_json::json!({
                        "action": decision.action.as_str(),
                        "source": format!("{:?}", decision.source).to_lowercase(),
                        "confidence": decision.confidence,
                        "reasoning": decision.reasoning,
                    });

                    let mut ev = TraceEvent {
                        task_id: task.task_id.clone(),
                        step_idx,
                        step_name: step.step_name.clone(),
                        tool_name: step.tool_name.clone(),
                        params: step.params.clone(),
                        status: StepStatus::Error,
                        latency_ms: result.latency_ms,
                        error_kind: Some(kind),
                        error_message: Some(message.clone()),
                        injected_fault: result.injected_fault.clone(),
                        post_state_hash: Some(post_hash),
                        budget: snapshot,
                        recovery_action: Some(wire_label),
                        decision_source: Some(decision.source),
                        attempt_idx,
                        event_type: EventType::ToolCall,
                        ts_ms: 0,
                        saga_depth: saga.depth(),
                        diagnosis: Some(diagnosis_payload),
                        final_outcome: None,
                        final_reason: None,
                        srr_eligible: None,
                        srr_pass: None,
                    };
                    ev.stamp();
                    trace.append(ev);

                    match decision.action {
                        Action::Fail => {
                            let outcome = Outcome::Failed;
                            saga.clear();
                            self.finish(
                                task,
                                trace,
                                &world,
                                &budget,
                                saga.depth(),
                                any_compensation,
                                outcome,
                                Some(format!("{kind:?}")),
                                &step.step_name,
                                &step.tool_name,
                            );
                            self.learn(task, &first_failure, outcome)?;
                            return Ok(outcome);
                        }
                        Action::Escalate | Action::Compensate => {
                            log::warn!("task {} escalated: {:?}", task.task_id, kind);
                            let outcome = Outcome::Escalated;
                            saga.clear();
                            self.finish(
                                task,
                                trace,
                                &world,
                                &budget,
                                saga.depth(),
                                any_compensation,
                                outcome,
                                Some(format!("{kind:?}")),
                                &step.step_name,
                                &step.tool_name,
                            );
                            self.learn(task, &first_failure, outcome)?;
                            return Ok(outcome);
                        }
                        Action::Retry => {
                            attempt_idx += 1;
                            self.clock.sleep(decision.backoff);
                        }
                        Action::Rollback | Action::RollbackThenRetry => {
                            world.restore(&checkpoint);

                            if self.saga_enabled {
                                let outcomes = saga.rollback(self.registry, &mut world);
                                if !outcomes.is_empty() {
                                    any_compensation = true;
                                }
                                let mut compensation_failed = false;
                                for outcome in &outcomes {
                                    budget.consume(&outcome.params);
                                    let failed = outcome.result.is_err();
                                    let mut cev = TraceEvent {
                                        task_id: task.task_id.clone(),
                                        step_idx,
                                        step_name: outcome.step_name.clone(),
                                        tool_name: outcome.tool_name.clone(),
                                        params: outcome.params.clone(),
                                        status: if failed { StepStatus::Error } else { StepStatus::Ok },
                                        latency_ms: 0,
                                        error_kind: outcome.result.as_ref().err().map(|e| e.kind),
                                        error_message: outcome.result.as_ref().err().map(|e| e.message.clone()),
                                        injected_fault: None,
                                        post_state_hash: Some(world.content_hash()),
                                        budget: budget.snapshot(),
                                        recovery_action: None,
                                        decision_source: None,
                                        attempt_idx,
                                        event_type: EventType::Compensation,
                                        ts_ms: 0,
                                        saga_depth: saga.depth(),
                                        diagnosis: None,
                                        final_outcome: None,
                                        final_reason: None,
                                        srr_eligible: None,
                                        srr_pass: None,
                                    };
                                    cev.stamp();
                                    trace.append(cev);
                                    if failed {
                                        compensation_failed = true;
                                        break;
                                    }
                                }

                                if budget.exhausted() {
                                    log::warn!("task {} escalated: budget_exhausted during rollback", task.task_id);
                                    let outcome = Outcome::Escalated;
                                    self.finish(
                                        task,
                                        trace,
                                        &world,
                                        &budget,
                                        saga.depth(),
                                        any_compensation,
                                        outcome,
                                        Some("budget_exhausted".to_string()),
                                        &step.step_name,
                                        &step.tool_name,
                                    );
                                    self.learn(task, &first_failure, outcome)?;
                                    return Ok(outcome);
                                }
                                if compensation_failed {
                                    log::warn!("task {} escalated: compensation_failed", task.task_id);
                                    let outcome = Outcome::Escalated;
                                    self.finish(
                                        task,
                                        trace,
                                        &world,
                                        &budget,
                                        saga.depth(),
                                        any_compensation,
                                        outcome,
                                        Some("compensation_failed".to_string()),
                                        &step.step_name,
                                        &step.tool_name,
                                    );
                                    self.learn(task, &first_failure, outcome)?;
                                    return Ok(outcome);
                                }
                            }

                            attempt_idx += 1;
                            self.clock.sleep(decision.backoff);
                        }
                    }
                }
            }
        }

        let success = oracle::evaluate_success(task, &world);
        let outcome = if success { Outcome::Success } else { Outcome::Failed };
        let reason = if success { None } else { Some("success_condition_not_met".to_string()) };
        // The plan ran to completion either way (committed or not), so any
        // compensations still on the stack are no longer needed. Only a
        // rollback interrupted by compensation_failed/budget_exhausted
        // leaves a genuinely dangling stack (see the saga-stack invariant).
        saga.clear();
        log::info!("task {} terminal outcome: {:?}", task.task_id, outcome);
        self.finish(
            task,
            trace,
            &world,
            &budget,
            saga.depth(),
            any_compensation,
            outcome,
            reason,
            &last_step_name,
            &last_tool_name,
        );
        self.learn(task, &first_failure, outcome)?;
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        task: &TaskDescriptor,
        trace: &mut dyn TraceStore,
        world: &WorldState,
        budget: &Budget,
        saga_depth: usize,
        any_compensation: bool,
        outcome: Outcome,
        reason: Option<String>,
        step_name: &str,
        tool_name: &str,
    ) {
        let (srr_eligible, srr_pass) = if any_compensation {
            let report = oracle::check_consistency(world, saga_depth);
            (Some(true), Some(report.pass()))
        } else {
            (None, None)
        };

        let mut ev = TraceEvent {
            task_id: task.task_id.clone(),
            step_idx: task.steps.len(),
            step_name: step_name.to_string(),
            tool_name: tool_name.to_string(),
            params: Value::Null,
            status: if outcome == Outcome::Success { StepStatus::Ok } else { StepStatus::Error },
            latency_ms: 0,
            error_kind: None,
            error_message: None,
            injected_fault: None,
            post_state_hash: Some(world.content_hash()),
            budget: budget.snapshot(),
            recovery_action: None,
            decision_source: None,
            attempt_idx: 0,
            event_type: EventType::Final,
            ts_ms: 0,
            saga_depth,
            diagnosis: None,
            final_outcome: Some(outcome),
            final_reason: reason,
            srr_eligible,
            srr_pass,
        };
        ev.stamp();
        trace.append(ev);
    }

    /// `B4` learning: upsert the first failure's signature/action against
    /// the final outcome. A no-op under every other strategy.
    fn learn(
        &self,
        task: &TaskDescriptor,
        first_failure: &Option<(FaultSignature, Action)>,
        outcome: Outcome,
    ) -> Result<(), EngineError> {
        if self.policy.strategy() != fl_policies::Strategy::B4 {
            return Ok(());
        }
        let (signature, action) = match first_failure {
            Some(pair) => pair,
            None => return Ok(()),
        };
        if let Some(bank) = self.policy.memory_bank() {
            let example = format!("{}:{}", task.task_id, signature.canonical_key());
            bank.upsert(signature, *action, outcome == Outcome::Success, example)
                .map_err(|e| EngineError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}
