//! Failed-login throttling per client address.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Attempts {
    count: u32,
    window_start: Instant,
}

/// Allows at most `max_attempts` unsuccessful logins per address within `window`.
///
/// An attempt is counted when it starts, so concurrent requests from one
/// address cannot overrun the limit. A successful login clears the count.
/// The window starts at the first counted attempt.
#[derive(Debug)]
pub struct LoginLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<IpAddr, Attempts>>,
}

impl LoginLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a login attempt from `addr`. Returns `false` when the address
    /// has used up its attempts for the current window.
    ///
    /// Entries whose window has passed are pruned.
    pub fn try_acquire(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.lock();
        attempts.retain(|_, entry| now.duration_since(entry.window_start) < self.window);

        let entry = attempts.entry(addr).or_insert(Attempts { count: 0, window_start: now });
        if entry.count >= self.max_attempts {
            return false;
        }
        entry.count += 1;
        true
    }

    pub fn reset(&self, addr: IpAddr) {
        self.attempts.lock().remove(&addr);
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.attempts.lock().len()
    }
}
