//! Self-imposed pacing between API calls.

use std::fmt::Debug;
use std::time::Duration;

/// Default pause inserted after every API call.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Strategy invoked by the client after every HTTP call, successful or not.
pub trait RateLimiter: Debug + Send + Sync {
    fn after_call(&self);
}

/// Sleep a fixed amount after each call. Not adaptive; ignores server hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay(DEFAULT_DELAY)
    }
}

impl RateLimiter for FixedDelay {
    fn after_call(&self) {
        if !self.0.is_zero() {
            std::thread::sleep(self.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn fixed_delay_sleeps_at_least_configured_duration() {
        let limiter = FixedDelay(Duration::from_millis(20));
        let start = Instant::now();
        limiter.after_call();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn default_is_half_a_second() {
        assert_eq!(FixedDelay::default().0, Duration::from_millis(500));
    }
}
