//! Budget tracking: monotone counters for tokens, tool calls and wall time
//! against a fixed bound. The runner consults [`Budget::exhausted`] before
//! every step and treats `true` as grounds for immediate escalation.

use crate::clock::Clock;
use crate::event::BudgetSnapshot;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct BudgetLimits {
    pub max_tokens: u64,
    pub max_tool_calls: u64,
    pub max_wall_seconds: f64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self { max_tokens: 50_000, max_tool_calls: 64, max_wall_seconds: 60.0 }
    }
}

pub struct Budget {
    limits: BudgetLimits,
    tokens_used: u64,
    calls_used: u64,
    start: Instant,
    clock: Arc<dyn Clock>,
}

/// Rough token estimate: one token per four bytes of the canonical
/// serialisation of the call parameters, floored.
pub fn estimate_tokens(params: &Value) -> u64 {
    let s = params.to_string();
    (s.len() as u64) / 4
}

impl Budget {
    pub fn new(limits: BudgetLimits, clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self { limits, tokens_used: 0, calls_used: 0, start, clock }
    }

    pub fn consume(&mut self, params: &Value) {
        self.tokens_used += estimate_tokens(params);
        self.calls_used += 1;
    }

    pub fn seconds_used(&self) -> f64 {
        self.clock.now().duration_since(self.start).as_secs_f64()
    }

    pub fn exhausted(&self) -> bool {
        self.tokens_used >= self.limits.max_tokens
            || self.calls_used >= self.limits.max_tool_calls
            || self.seconds_used() >= self.limits.max_wall_seconds
    }

    pub fn remaining_calls(&self) -> i64 {
        self.limits.max_tool_calls as i64 - self.calls_used as i64
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            tokens_used: self.tokens_used,
            tokens_remaining: self.limits.max_tokens as i64 - self.tokens_used as i64,
            calls_used: self.calls_used,
            calls_remaining: self.remaining_calls(),
            seconds_used: self.seconds_used(),
            seconds_remaining: self.limits.max_wall_seconds - self.seconds_used(),
        }
    }
}
