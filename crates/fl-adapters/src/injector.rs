//! Deterministic fault injector: a pure function of (config, step, task,
//! world, attempt) whose only source of randomness is [`fl_core::hashing::seeded_unit`]
//! seeded from the process-wide seed plus the call's identity.

use fl_domain::fault::{FaultConfig, FaultMode};
use fl_domain::world::WorldState;

pub struct FaultInjector {
    seed: u64,
}

impl FaultInjector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Returns `true` if `cfg` fires at this attempt, mutating `world`'s
    /// per-fault bookkeeping as needed so repeated calls with the same
    /// identity reproduce the same decision.
    pub fn decide(
        &self,
        cfg: &FaultConfig,
        task_id: &str,
        step_idx: usize,
        attempt_idx: u32,
        world: &mut WorldState,
    ) -> bool {
        let state = world.fault_state.entry(cfg.fault_id.clone()).or_default();

        match cfg.mode {
            FaultMode::PerAttempt => {
                let roll = fl_core::hashing::seeded_unit(
                    self.seed,
                    &[task_id, &cfg.fault_id, "per_attempt", &step_idx.to_string(), &attempt_idx.to_string()],
                );
                roll < cfg.probability
            }
            FaultMode::Persistent => {
                if state.sampled.is_none() {
                    let roll = fl_core::hashing::seeded_unit(
                        self.seed,
                        &[task_id, &cfg.fault_id, "persistent", &step_idx.to_string()],
                    );
                    state.sampled = Some(roll < cfg.probability);
                }
                state.sampled.unwrap_or(false)
            }
            FaultMode::Once => {
                if state.fired_once {
                    return false;
                }
                if state.sampled.is_none() {
                    let roll = fl_core::hashing::seeded_unit(
                        self.seed,
                        &[task_id, &cfg.fault_id, "once", &step_idx.to_string()],
                    );
                    state.sampled = Some(roll < cfg.probability);
                }
                if state.sampled == Some(true) {
                    state.fired_once = true;
                    true
                } else {
                    false
                }
            }
            FaultMode::StatefulConflict => {
                if state.resolved {
                    return false;
                }
                if state.sampled.is_none() {
                    let sampled = if cfg.force_first_attempt && attempt_idx == 0 {
                        true
                    } else {
                        let roll = fl_core::hashing::seeded_unit(
                            self.seed,
                            &[task_id, &cfg.fault_id, "stateful_conflict", &step_idx.to_string()],
                        );
                        roll < cfg.probability
                    };
                    state.sampled = Some(sampled);
                    if sampled {
                        state.rollback_count_at_activation = Some(world.rollback_count());
                    }
                }
                if state.sampled != Some(true) {
                    return false;
                }
                let activation = state.rollback_count_at_activation.unwrap_or(0);
                if world.rollback_count() > activation {
                    state.resolved = true;
                    return false;
                }
                true
            }
        }
    }
}
