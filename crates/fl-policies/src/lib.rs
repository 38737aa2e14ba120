//! Recovery policy: the single entry point the runner asks "what do I do
//! about this failure". Strategies B0-B4 range from "never recover" through
//! a fixed rule table to diagnosis- and memory-driven decisions, all run
//! through a shared safety guard before being handed back.
//!
//! The decision/rationale split mirrors this workspace's existing
//! selection-policy pattern: every [`RecoveryDecision`] carries not just an
//! action but the source that produced it, for audit and for the trace.

use fl_core::event::{Action, DecisionSource, ErrorKind};
use fl_domain::fault::FaultSignature;
use fl_persistence::MemoryBank;
use fl_providers::{DiagnosisClassifier, FailureInfo, RecoveryHistory, StepContext};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    B0,
    B1,
    B2,
    B3,
    B4,
}

#[derive(Debug, Clone)]
pub struct RecoveryDecision {
    pub action: Action,
    pub source: DecisionSource,
    pub confidence: Option<f64>,
    pub reasoning: String,
    pub backoff: Duration,
}

const MAX_RETRIES: u32 = 3;
const DEFAULT_MEMORY_THRESHOLD: f64 = 0.8;
const DIAGNOSIS_CONFIDENCE_THRESHOLD: f64 = 0.7;

pub struct RecoveryPolicy {
    strategy: Strategy,
    diagnosis: Box<dyn DiagnosisClassifier>,
    memory: Option<Arc<MemoryBank>>,
    memory_threshold: f64,
}

impl RecoveryPolicy {
    pub fn new(strategy: Strategy, diagnosis: Box<dyn DiagnosisClassifier>, memory: Option<Arc<MemoryBank>>) -> Self {
        Self { strategy, diagnosis, memory, memory_threshold: DEFAULT_MEMORY_THRESHOLD }
    }

    pub fn with_memory_threshold(mut self, threshold: f64) -> Self {
        self.memory_threshold = threshold;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The memory bank backing a `B4` policy, if any, exposed so the
    /// runner can upsert the first failure's outcome at end-of-task without
    /// holding a second `Arc` to the same bank.
    pub fn memory_bank(&self) -> Option<&Arc<MemoryBank>> {
        self.memory.as_ref()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decide(
        &self,
        failure: &FailureInfo<'_>,
        ctx: &StepContext<'_>,
        history: &RecoveryHistory,
        signature: &FaultSignature,
        remaining_calls: i64,
        remaining_seconds: f64,
    ) -> RecoveryDecision {
        let raw = match self.strategy {
            Strategy::B0 => RecoveryDecision {
                action: Action::Fail,
                source: DecisionSource::Rule,
                confidence: None,
                reasoning: "B0 never recovers".into(),
                backoff: Duration::ZERO,
            },
            Strategy::B1 => self.decide_b1(history),
            Strategy::B2 => self.decide_b2_rule(failure, history),
            Strategy::B3 => self.decide_b3(failure, ctx, history),
            Strategy::B4 => self.decide_b4(failure, ctx, history, signature),
        };
        apply_safety_guard(raw, history.retry_count, remaining_calls, remaining_seconds)
    }

    fn decide_b1(&self, history: &RecoveryHistory) -> RecoveryDecision {
        if history.retry_count < MAX_RETRIES {
            RecoveryDecision {
                action: Action::Retry,
                source: DecisionSource::Rule,
                confidence: None,
                reasoning: "B1 fixed retry".into(),
                backoff: Duration::from_millis(100),
            }
        } else {
            RecoveryDecision {
                action: Action::Fail,
                source: DecisionSource::Rule,
                confidence: None,
                reasoning: "B1 retry budget exhausted".into(),
                backoff: Duration::ZERO,
            }
        }
    }

    fn decide_b2_rule(&self, failure: &FailureInfo<'_>, history: &RecoveryHistory) -> RecoveryDecision {
        let (action, reasoning) = match failure.kind {
            ErrorKind::Timeout | ErrorKind::Http500 => {
                if history.retry_count < MAX_RETRIES {
                    (Action::Retry, "B2 rule: transient kind, retry")
                } else {
                    (Action::Escalate, "B2 rule: transient kind exhausted retries")
                }
            }
            ErrorKind::Conflict => {
                if history.retry_count < MAX_RETRIES {
                    (Action::Rollback, "B2 rule: conflict, rollback")
                } else {
                    (Action::Escalate, "B2 rule: conflict exhausted retries")
                }
            }
            _ => (Action::Escalate, "B2 rule: non-recoverable kind"),
        };
        RecoveryDecision {
            action,
            source: DecisionSource::Rule,
            confidence: None,
            reasoning: reasoning.into(),
            backoff: backoff_for(history.retry_count),
        }
    }

    fn decide_b3(&self, failure: &FailureInfo<'_>, ctx: &StepContext<'_>, history: &RecoveryHistory) -> RecoveryDecision {
        let rhistory = RecoveryHistory { retry_count: history.retry_count };
        match self.diagnosis.diagnose(ctx, failure, &rhistory) {
            Ok(d) if d.confidence >= DIAGNOSIS_CONFIDENCE_THRESHOLD => RecoveryDecision {
                action: d.action,
                source: DecisionSource::Diagnosis,
                confidence: Some(d.confidence),
                reasoning: d.reasoning,
                backoff: backoff_for(history.retry_count),
            },
            _ => self.low_confidence_fallback(failure, history),
        }
    }

    fn low_confidence_fallback(&self, failure: &FailureInfo<'_>, history: &RecoveryHistory) -> RecoveryDecision {
        if failure.kind == ErrorKind::NotFound && history.retry_count < 2 {
            return RecoveryDecision {
                action: Action::Retry,
                source: DecisionSource::Rule,
                confidence: None,
                reasoning: "low-confidence fallback: retry not-found".into(),
                backoff: backoff_for(history.retry_count),
            };
        }
        self.decide_b2_rule(failure, history)
    }

    fn decide_b4(
        &self,
        failure: &FailureInfo<'_>,
        ctx: &StepContext<'_>,
        history: &RecoveryHistory,
        signature: &FaultSignature,
    ) -> RecoveryDecision {
        if let Some(bank) = &self.memory {
            if let Some(hit) = bank.query(signature) {
                if hit.confidence >= self.memory_threshold {
                    return RecoveryDecision {
                        action: hit.action,
                        source: DecisionSource::Memory,
                        confidence: Some(hit.confidence),
                        reasoning: format!("memory hit on {}", hit.matched_key),
                        backoff: backoff_for(history.retry_count),
                    };
                }
            }
        }
        self.decide_b3(failure, ctx, history)
    }
}

fn backoff_for(retry_count: u32) -> Duration {
    let base_ms = 100u64;
    let capped = base_ms.saturating_mul(1u64 << retry_count.min(2));
    Duration::from_millis(capped.min(400))
}

fn apply_safety_guard(
    mut decision: RecoveryDecision,
    retry_count: u32,
    remaining_calls: i64,
    remaining_seconds: f64,
) -> RecoveryDecision {
    let recoverable = matches!(decision.action, Action::Retry | Action::Rollback | Action::RollbackThenRetry);
    let backoff_exceeds_wall_time = decision.backoff.as_secs_f64() > remaining_seconds;
    if recoverable && (remaining_calls <= 1 || retry_count >= MAX_RETRIES || backoff_exceeds_wall_time) {
        decision.action = Action::Escalate;
        decision.source = DecisionSource::Rule;
        decision.reasoning = format!("{} (safety guard upgraded to escalate)", decision.reasoning);
    }
    decision
}
