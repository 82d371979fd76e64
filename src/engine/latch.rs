//! One-shot "engine stopped" signal for hosts that must outlive the reset

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Set once the engine has reset the keyboard and released it
#[derive(Clone, Default)]
pub struct StopLatch {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn signal(&self) {
        let (stopped, cond) = &*self.inner;
        *stopped.lock() = true;
        cond.notify_all();
    }

    pub fn is_signaled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Block until signaled or `timeout` elapses; returns whether signaled
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (stopped, cond) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut guard = stopped.lock();
        while !*guard {
            if cond.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        *guard
    }
}
