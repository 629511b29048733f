//! Time sources for the runtime.
//!
//! The runtime never reads the wall clock directly. Timers (`delay`) and
//! animations ask the runtime's [`Clock`], so tests can install a
//! [`TestClock`] and step time deterministically.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Blocks until `deadline`. Virtual clocks jump straight to it.
    fn sleep_until(&self, deadline: Instant) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you can drive by hand. Clones share the same time.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<Instant>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Moves the clock forward to `t`. Never moves it backwards.
    pub fn set(&self, t: Instant) {
        let mut now = self.now.lock();
        if t > *now {
            *now = t;
        }
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn sleep_until(&self, deadline: Instant) {
        self.set(deadline);
    }
}
