//! Failed sign-in throttling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Counts failed password attempts per email in a fixed window.
///
/// Once `max_failures` failures land inside one window, further attempts for
/// that email are refused until the window lapses. A successful sign-in
/// clears the counter.
#[derive(Clone, Debug)]
pub struct SignInThrottle {
    state: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
}

impl SignInThrottle {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (u32, Instant)>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("sign-in throttle lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        }
    }

    /// Returns `false` when `email` has exhausted its failures for the
    /// current window.
    pub fn is_allowed(&self, email: &str) -> bool {
        let mut state = self.lock();
        let now = Instant::now();
        match state.get(email) {
            Some((_, start)) if now.duration_since(*start) > self.window => {
                state.remove(email);
                true
            }
            Some((count, _)) => *count < self.max_failures,
            None => true,
        }
    }

    /// Records a failed attempt for `email`.
    pub fn record_failure(&self, email: &str) {
        let mut state = self.lock();
        let now = Instant::now();

        if state.len() > 10_000 {
            let window = self.window;
            state.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let (count, start) = state.entry(email.to_string()).or_insert((0, now));
        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Forgets every failure recorded for `email`.
    pub fn reset(&self, email: &str) {
        self.lock().remove(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_failures() {
        let throttle = SignInThrottle::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(throttle.is_allowed("jo@x.com"));
            throttle.record_failure("jo@x.com");
        }
        assert!(!throttle.is_allowed("jo@x.com"));
        assert!(throttle.is_allowed("other@x.com"));
    }

    #[test]
    fn reset_clears_failures() {
        let throttle = SignInThrottle::new(1, Duration::from_secs(60));
        throttle.record_failure("jo@x.com");
        assert!(!throttle.is_allowed("jo@x.com"));
        throttle.reset("jo@x.com");
        assert!(throttle.is_allowed("jo@x.com"));
    }

    #[test]
    fn window_lapses() {
        let throttle = SignInThrottle::new(1, Duration::from_millis(20));
        throttle.record_failure("jo@x.com");
        assert!(!throttle.is_allowed("jo@x.com"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(throttle.is_allowed("jo@x.com"));
    }
}
