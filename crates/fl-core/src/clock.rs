//! Clock abstraction so latency/backoff sleeps and elapsed-time budget
//! checks can be swapped for a virtual clock in tests without touching
//! control flow.

use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Test clock: `now()` advances only when `sleep` is called, so determinism
/// tests never spend real wall-time and elapsed-time accounting stays exact.
pub struct VirtualClock {
    start: Instant,
    elapsed: std::sync::atomic::AtomicU64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: std::sync::atomic::AtomicU64::new(0) }
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        let ms = self.elapsed.load(std::sync::atomic::Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
    fn sleep(&self, d: Duration) {
        self.elapsed.fetch_add(d.as_millis() as u64, std::sync::atomic::Ordering::SeqCst);
    }
}
