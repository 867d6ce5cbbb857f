use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// Source of simulated time. `unlock_time` releases whoever paces the tick
/// loop; under lockstep that happens only once telemetry for the current
/// tick went out.
pub trait Clock {
    fn current_time_us(&self) -> u64;
    fn unlock_time(&self);
}

/// Shared lockstep clock: the pacing side advances time (which re-arms the
/// gate) and then waits for the simulation to unlock it.
#[derive(Debug, Clone, Default)]
pub struct LockstepClock {
    inner: Arc<ClockInner>,
}

#[derive(Debug, Default)]
struct ClockInner {
    time_us: AtomicU64,
    unlocked: Mutex<bool>,
    cond: Condvar,
}

impl LockstepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance simulated time and lock the gate for the coming tick.
    pub fn advance(&self, dt_us: u64) {
        self.inner.time_us.fetch_add(dt_us, Ordering::SeqCst);
        *self.inner.unlocked.lock().unwrap() = false;
    }

    /// Block until the simulation unlocks the gate or the timeout expires.
    /// Returns true when the gate was unlocked.
    pub fn wait_unlocked(&self, timeout: Duration) -> bool {
        let guard = self.inner.unlocked.lock().unwrap();
        let (guard, _) = self
            .inner
            .cond
            .wait_timeout_while(guard, timeout, |unlocked| !*unlocked)
            .unwrap();
        *guard
    }
}

impl Clock for LockstepClock {
    fn current_time_us(&self) -> u64 {
        self.inner.time_us.load(Ordering::SeqCst)
    }

    fn unlock_time(&self) {
        *self.inner.unlocked.lock().unwrap() = true;
        self.inner.cond.notify_all();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
