use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use vm_scaling_core::ports::Clock;

/// Sleeping advances time instantly; every sleep is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<(Duration, Vec<Duration>)>,
}

impl ManualClock {
    fn state(&self) -> MutexGuard<'_, (Duration, Vec<Duration>)> {
        self.state.lock().expect("clock lock")
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().1.clone()
    }

    pub fn slept_for(&self, duration: Duration) -> usize {
        self.sleeps().iter().filter(|slept| **slept == duration).count()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.state().0
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state();
        state.0 += duration;
        state.1.push(duration);
    }
}
