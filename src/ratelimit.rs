//! Cooperative self-rate-limit for outbound search calls.
//!
//! Every phase query passes through `wait()` before hitting the network.
//! This is spacing, not contention control — the resolver is sequential, but
//! the last-call instant sits behind a mutex so the value stays correct if
//! parallelism is ever added.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Block until at least the configured interval has passed since the
    /// previous call, then record this call. The first call never sleeps.
    pub fn wait(&self) {
        let mut last = self.last_call.lock();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}
